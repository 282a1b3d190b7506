//! Deal model.
//!
//! A deal is one priced offer for a product at a retailer. Deals are
//! transient: they are produced per search and never persisted directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters kept from a listing title.
pub const MAX_TITLE_CHARS: usize = 100;

/// Errors raised when constructing a deal.
#[derive(Debug, Error, PartialEq)]
pub enum DealError {
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),
}

/// Stock state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    #[serde(alias = "In Stock")]
    InStock,
    #[serde(alias = "Limited Stock")]
    LimitedStock,
    #[serde(alias = "Out of Stock")]
    OutOfStock,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LimitedStock => "limited_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::LimitedStock => "Limited Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Quality tier derived from the discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealQuality {
    Excellent,
    Good,
    Fair,
}

impl DealQuality {
    /// Tier for a discount percentage: 30 and up is excellent, 15 and up is good.
    pub fn from_discount(discount_percentage: u8) -> Self {
        if discount_percentage >= 30 {
            Self::Excellent
        } else if discount_percentage >= 15 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

impl std::fmt::Display for DealQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounded percentage saved relative to the original price.
pub fn discount_percentage(price: f64, original_price: f64) -> u8 {
    if original_price <= 0.0 || original_price <= price {
        return 0;
    }
    let pct = (100.0 * (original_price - price) / original_price).round();
    pct.clamp(0.0, 100.0) as u8
}

/// A priced offer at a retailer.
///
/// Fields are only reachable through accessors so that the price,
/// original price, discount and tier always agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    retailer: String,
    title: Option<String>,
    price: f64,
    original_price: f64,
    discount_percentage: u8,
    url: String,
    availability: Availability,
    quality: DealQuality,
}

impl Deal {
    /// Build a deal, raising a missing or lower original price to `price`.
    pub fn new(
        retailer: impl Into<String>,
        price: f64,
        original_price: Option<f64>,
        url: impl Into<String>,
    ) -> Result<Self, DealError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(DealError::InvalidPrice(price));
        }
        let original_price = original_price
            .filter(|p| p.is_finite() && *p > price)
            .unwrap_or(price);
        let discount = discount_percentage(price, original_price);

        Ok(Self {
            retailer: retailer.into(),
            title: None,
            price,
            original_price,
            discount_percentage: discount,
            url: url.into(),
            availability: Availability::InStock,
            quality: DealQuality::from_discount(discount),
        })
    }

    /// Attach a listing title, truncated to [`MAX_TITLE_CHARS`].
    pub fn with_title(mut self, title: &str) -> Self {
        let title = title.trim();
        self.title = if title.is_empty() {
            None
        } else {
            Some(title.chars().take(MAX_TITLE_CHARS).collect())
        };
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn retailer(&self) -> &str {
        &self.retailer
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn original_price(&self) -> f64 {
        self.original_price
    }

    pub fn discount_percentage(&self) -> u8 {
        self.discount_percentage
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn quality(&self) -> DealQuality {
        self.quality
    }
}

/// Sort deals by price, cheapest first. The sort is stable.
pub fn sort_by_price(deals: &mut [Deal]) {
    deals.sort_by(|a, b| a.price.total_cmp(&b.price));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rounds_to_nearest() {
        assert_eq!(discount_percentage(799.0, 999.0), 20);
        assert_eq!(discount_percentage(66.5, 100.0), 34);
        assert_eq!(discount_percentage(100.0, 100.0), 0);
        assert_eq!(discount_percentage(10.0, 0.0), 0);
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(DealQuality::from_discount(0), DealQuality::Fair);
        assert_eq!(DealQuality::from_discount(14), DealQuality::Fair);
        assert_eq!(DealQuality::from_discount(15), DealQuality::Good);
        assert_eq!(DealQuality::from_discount(29), DealQuality::Good);
        assert_eq!(DealQuality::from_discount(30), DealQuality::Excellent);
        assert_eq!(DealQuality::from_discount(100), DealQuality::Excellent);
    }

    #[test]
    fn test_new_raises_low_original_price() {
        let deal = Deal::new("Amazon", 450.0, Some(400.0), "https://a").unwrap();
        assert_eq!(deal.original_price(), 450.0);
        assert_eq!(deal.discount_percentage(), 0);
        assert_eq!(deal.quality(), DealQuality::Fair);

        let deal = Deal::new("Amazon", 450.0, None, "https://a").unwrap();
        assert_eq!(deal.original_price(), 450.0);
    }

    #[test]
    fn test_new_derives_discount_and_quality() {
        let deal = Deal::new("Walmart", 70.0, Some(100.0), "https://w").unwrap();
        assert_eq!(deal.discount_percentage(), 30);
        assert_eq!(deal.quality(), DealQuality::Excellent);
        assert!(deal.original_price() >= deal.price());
    }

    #[test]
    fn test_new_rejects_bad_prices() {
        assert!(Deal::new("Amazon", 0.0, None, "u").is_err());
        assert!(Deal::new("Amazon", -3.0, None, "u").is_err());
        assert!(Deal::new("Amazon", f64::NAN, None, "u").is_err());
    }

    #[test]
    fn test_title_truncated() {
        let long = "x".repeat(250);
        let deal = Deal::new("Best Buy", 1.0, None, "u").unwrap().with_title(&long);
        assert_eq!(deal.title().map(|t| t.chars().count()), Some(MAX_TITLE_CHARS));

        let blank = Deal::new("Best Buy", 1.0, None, "u").unwrap().with_title("  ");
        assert_eq!(blank.title(), None);
    }

    #[test]
    fn test_sort_by_price() {
        let mut deals: Vec<Deal> = [899.0, 799.0, 999.0]
            .iter()
            .map(|p| Deal::new("r", *p, None, "u").unwrap())
            .collect();
        sort_by_price(&mut deals);
        let prices: Vec<f64> = deals.iter().map(Deal::price).collect();
        assert_eq!(prices, vec![799.0, 899.0, 999.0]);
    }

    #[test]
    fn test_availability_accepts_labels() {
        let a: Availability = serde_json::from_str("\"Limited Stock\"").unwrap();
        assert_eq!(a, Availability::LimitedStock);
        let b: Availability = serde_json::from_str("\"out_of_stock\"").unwrap();
        assert_eq!(b, Availability::OutOfStock);
    }
}
