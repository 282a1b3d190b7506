//! Shared formatting for CLI output.

use console::style;

use crate::models::{Deal, DealQuality};

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

pub fn print_deal(index: usize, deal: &Deal) {
    let quality = match deal.quality() {
        DealQuality::Excellent => style(deal.quality().as_str()).green().bold(),
        DealQuality::Good => style(deal.quality().as_str()).cyan(),
        DealQuality::Fair => style(deal.quality().as_str()).dim(),
    };

    println!(
        "{:>2}. {:<10} {:>10} {:>10} {:>4}% {:<10} {}",
        index,
        truncate(deal.retailer(), 10),
        style(format_price(deal.price())).bold(),
        format_price(deal.original_price()),
        deal.discount_percentage(),
        quality,
        deal.availability()
    );
    if let Some(title) = deal.title() {
        println!("    {}", style(truncate(title, 70)).dim());
    }
    println!("    {}", style(deal.url()).underlined());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer product name", 10), "a much ...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(450.0), "$450.00");
        assert_eq!(format_price(19.999), "$20.00");
    }
}
