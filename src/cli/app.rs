//! Wiring of config into the store, finder and poller.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregator::DealAggregator;
use crate::browser::{chromium_session, FetchSession};
use crate::config::Config;
use crate::finder::DealFinder;
use crate::llm::LlmClient;
use crate::poller::PricePoller;
use crate::repository::{SqliteStore, TrackingStore};
use crate::synthetic::SyntheticDealGenerator;
use crate::timing::LlmTimingAnalyzer;

pub struct App {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub user: String,
}

/// A finder plus the session it drives, so the browser can be closed.
pub struct SearchStack {
    pub finder: Arc<DealFinder>,
    pub llm: Option<Arc<LlmClient>>,
    session: Arc<FetchSession>,
}

impl SearchStack {
    pub async fn shutdown(&self) {
        if let Err(e) = self.session.shutdown().await {
            warn!("Browser did not shut down cleanly: {}", e);
        }
    }
}

impl App {
    pub async fn open(config: Config, database: Option<&Path>, user: &str) -> anyhow::Result<Self> {
        let db_path = config.database_path(database);
        debug!("Using database {}", db_path.display());
        let store = SqliteStore::open(&db_path).await?;

        Ok(Self {
            config,
            store: Arc::new(store),
            user: user.to_string(),
        })
    }

    pub fn search_stack(&self) -> anyhow::Result<SearchStack> {
        let session = Arc::new(chromium_session(&self.config.browser));
        let aggregator = DealAggregator::new(session.clone())
            .with_retailer_delay(self.config.scraper.retailer_delay());

        let llm = if self.config.llm.enabled {
            Some(Arc::new(LlmClient::new(self.config.llm.clone())?))
        } else {
            None
        };

        let mut finder = DealFinder::new(aggregator);
        if let (Some(llm), true) = (&llm, self.config.scraper.synthetic_fallback) {
            finder = finder.with_generator(
                SyntheticDealGenerator::new(llm.clone()).with_temperature(self.config.llm.temperature),
            );
        }

        Ok(SearchStack {
            finder: Arc::new(finder),
            llm,
            session,
        })
    }

    pub fn poller(&self, stack: &SearchStack) -> PricePoller {
        let store: Arc<dyn TrackingStore> = self.store.clone();
        let mut poller = PricePoller::new(store, stack.finder.clone())
            .with_product_delay(self.config.poller.product_delay())
            .with_deals_per_search(self.config.scraper.deals_per_search);

        if self.config.poller.timing_alerts {
            if let Some(ref llm) = stack.llm {
                poller = poller.with_timing(Arc::new(LlmTimingAnalyzer::new(llm.clone())));
            }
        }
        poller
    }
}
