//! Per-retailer result extraction.
//!
//! Each retailer gets one [`RetailerExtractor`]. Extractors prefer embedded
//! structured data and fall back to scraping markup. A listing that fails to
//! parse is skipped, never raised.

mod amazon;
mod bestbuy;
pub mod common;
mod walmart;

use std::time::Duration;

use tracing::debug;

use crate::models::Deal;

pub use amazon::Amazon;
pub use bestbuy::BestBuy;
pub use common::Skip;
pub use walmart::Walmart;

/// Deals parsed from one page, plus how many listings were dropped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub deals: Vec<Deal>,
    pub skipped: usize,
}

impl Extraction {
    /// Collect per-listing results, stopping once `max_results` deals parsed.
    pub fn collect<I>(retailer: &str, results: I, max_results: usize) -> Self
    where
        I: IntoIterator<Item = Result<Deal, Skip>>,
    {
        let mut extraction = Self::default();
        for result in results {
            if extraction.deals.len() >= max_results {
                break;
            }
            match result {
                Ok(deal) => extraction.deals.push(deal),
                Err(skip) => {
                    debug!("Skipping {} listing: {}", retailer, skip);
                    extraction.skipped += 1;
                }
            }
        }
        extraction
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Use `self` if it found anything, otherwise run the fallback.
    pub fn or_else(self, fallback: impl FnOnce() -> Extraction) -> Extraction {
        if self.is_empty() {
            let mut other = fallback();
            other.skipped += self.skipped;
            other
        } else {
            self
        }
    }
}

/// Turns a retailer's search page into deals.
pub trait RetailerExtractor: Send + Sync {
    /// Display name, also stored as the deal's retailer.
    fn name(&self) -> &str;

    /// Search page URL for a product query.
    fn search_url(&self, product: &str) -> String;

    /// How long to let the page settle after navigation.
    fn wait_hint(&self) -> Duration;

    /// Parse up to `max_results` deals from the page fetched from `page_url`.
    /// Listings without a product link point at `page_url`. Never fails; may
    /// be empty.
    fn extract(&self, content: &str, page_url: &str, max_results: usize) -> Extraction;
}

/// The retailers visited, in visiting order.
pub fn default_extractors() -> Vec<Box<dyn RetailerExtractor>> {
    vec![Box::new(Amazon), Box::new(Walmart), Box::new(BestBuy)]
}
