//! Runs every retailer extractor for a product and merges the results.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::PageFetcher;
use crate::models::{sort_by_price, Deal};
use crate::retailers::{default_extractors, RetailerExtractor};

/// Default pause after each retailer.
pub const DEFAULT_RETAILER_DELAY: Duration = Duration::from_secs(2);

/// Visits retailers in a fixed order through one shared fetcher.
pub struct DealAggregator {
    fetcher: Arc<dyn PageFetcher>,
    extractors: Vec<Box<dyn RetailerExtractor>>,
    retailer_delay: Duration,
}

impl DealAggregator {
    /// Aggregator over the default retailers.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_extractors(fetcher, default_extractors())
    }

    pub fn with_extractors(
        fetcher: Arc<dyn PageFetcher>,
        extractors: Vec<Box<dyn RetailerExtractor>>,
    ) -> Self {
        Self {
            fetcher,
            extractors,
            retailer_delay: DEFAULT_RETAILER_DELAY,
        }
    }

    /// Set the pause after each retailer.
    pub fn with_retailer_delay(mut self, delay: Duration) -> Self {
        self.retailer_delay = delay;
        self
    }

    pub fn retailer_count(&self) -> usize {
        self.extractors.len()
    }

    /// Let the fetcher drop failure state left by an earlier run.
    pub async fn prepare(&self) {
        self.fetcher.recover().await;
    }

    /// Search every retailer and return all deals, cheapest first.
    ///
    /// A retailer that fails is logged and skipped. The pause after each
    /// retailer is always taken, including after failures.
    pub async fn search_all(&self, product: &str, per_retailer_limit: usize) -> Vec<Deal> {
        let mut deals = Vec::new();

        for extractor in &self.extractors {
            let url = extractor.search_url(product);
            info!("Searching {} for {:?}", extractor.name(), product);

            match self.fetcher.fetch(&url, extractor.wait_hint()).await {
                Ok(content) => {
                    let extraction = extractor.extract(&content, &url, per_retailer_limit);
                    debug!(
                        "{}: {} deals, {} listings skipped",
                        extractor.name(),
                        extraction.deals.len(),
                        extraction.skipped
                    );
                    deals.extend(extraction.deals);
                }
                Err(e) => {
                    warn!("Skipping {} for {:?}: {}", extractor.name(), product, e);
                }
            }

            tokio::time::sleep(self.retailer_delay).await;
        }

        sort_by_price(&mut deals);
        deals
    }
}
