//! One-off search.

use console::style;

use crate::finder::DealSource;

use super::helpers::print_deal;
use super::App;

pub async fn cmd_search(app: &App, name: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(app.config.scraper.deals_per_search).max(1);
    let stack = app.search_stack()?;

    println!("{} Searching for {}...", style("→").cyan(), style(name).bold());
    let result = stack.finder.find(name, limit).await;
    stack.shutdown().await;
    let outcome = result?;

    if outcome.deals.is_empty() {
        println!("{} No deals found", style("!").yellow());
        if !stack.finder.has_fallback() {
            println!("  Enable the LLM in your config to get generated estimates when retailers block scraping.");
        }
        return Ok(());
    }

    if outcome.is_synthetic() {
        println!(
            "{} No retailer returned results; showing generated estimates",
            style("!").yellow()
        );
    }

    println!();
    for (i, deal) in outcome.deals.iter().enumerate() {
        print_deal(i + 1, deal);
    }
    Ok(())
}
