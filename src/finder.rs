//! Live search with a generated fallback.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregator::DealAggregator;
use crate::models::Deal;
use crate::synthetic::{GenerationError, SyntheticDealGenerator};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Fallback generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Where a set of deals came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealOrigin {
    Live,
    Synthetic,
}

impl DealOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Synthetic => "synthetic",
        }
    }
}

/// Deals for one search, cheapest first.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub deals: Vec<Deal>,
    pub origin: DealOrigin,
}

impl SearchOutcome {
    pub fn cheapest(&self) -> Option<&Deal> {
        self.deals.first()
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin == DealOrigin::Synthetic
    }
}

/// Anything that can answer "what are the deals for this product".
#[async_trait]
pub trait DealSource: Send + Sync {
    async fn find(&self, product: &str, limit: usize) -> Result<SearchOutcome, SearchError>;

    /// Called once before each batch of searches.
    async fn prepare(&self) {}
}

pub struct DealFinder {
    aggregator: DealAggregator,
    generator: Option<SyntheticDealGenerator>,
}

impl DealFinder {
    pub fn new(aggregator: DealAggregator) -> Self {
        Self {
            aggregator,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: SyntheticDealGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.generator.is_some()
    }

    fn per_retailer_limit(&self, limit: usize) -> usize {
        limit / self.aggregator.retailer_count().max(1) + 1
    }
}

#[async_trait]
impl DealSource for DealFinder {
    async fn find(&self, product: &str, limit: usize) -> Result<SearchOutcome, SearchError> {
        let mut deals = self
            .aggregator
            .search_all(product, self.per_retailer_limit(limit))
            .await;

        if !deals.is_empty() {
            deals.truncate(limit);
            return Ok(SearchOutcome {
                deals,
                origin: DealOrigin::Live,
            });
        }

        let Some(generator) = &self.generator else {
            info!("No live deals for {:?} and no fallback configured", product);
            return Ok(SearchOutcome {
                deals,
                origin: DealOrigin::Live,
            });
        };

        warn!("No live deals for {:?}, generating synthetic deals", product);
        let deals = generator.generate(product, limit).await?;
        Ok(SearchOutcome {
            deals,
            origin: DealOrigin::Synthetic,
        })
    }

    async fn prepare(&self) {
        self.aggregator.prepare().await;
    }
}
