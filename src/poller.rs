//! Periodic price check over every tracked product.
//!
//! One run visits products strictly in sequence. For each one it searches,
//! records the cheapest price, and raises price and timing alerts. A failing
//! product is logged and counted; it never stops the run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::finder::DealSource;
use crate::models::{AlertKind, Deal, TrackedProduct};
use crate::repository::{StoreError, TrackingStore};
use crate::timing::{TimingAnalysis, TimingAnalyzer};

/// Default pause between products.
pub const DEFAULT_PRODUCT_DELAY: Duration = Duration::from_secs(2);

/// Default number of deals requested per product.
pub const DEFAULT_DEALS_PER_SEARCH: usize = 5;

/// Counters for one poll run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub checked: usize,
    pub failed: usize,
    pub price_alerts: usize,
    pub timing_alerts: usize,
    pub synthetic: usize,
}

impl fmt::Display for PollReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked, {} failed, {} price alerts, {} timing alerts, {} synthetic",
            self.checked, self.failed, self.price_alerts, self.timing_alerts, self.synthetic
        )
    }
}

/// What happened to one product.
#[derive(Debug, Default)]
struct ProductOutcome {
    price_alert: bool,
    timing_alert: bool,
    synthetic: bool,
}

#[derive(Debug, thiserror::Error)]
enum ProductError {
    #[error(transparent)]
    Search(#[from] crate::finder::SearchError),
    #[error("no deals found")]
    NoDeals,
    #[error("could not record price: {0}")]
    Record(#[from] StoreError),
}

pub fn price_alert_message(product: &TrackedProduct, deal: &Deal) -> String {
    format!(
        "Price Alert! {} is now ${:.2} at {} (Target: ${:.2})",
        product.name,
        deal.price(),
        deal.retailer(),
        product.target_price
    )
}

pub fn timing_alert_message(product: &TrackedProduct, analysis: &TimingAnalysis) -> String {
    format!(
        "Timing Alert! Consider waiting for {}. {}",
        product.name, analysis.reasoning
    )
}

pub struct PricePoller {
    store: Arc<dyn TrackingStore>,
    source: Arc<dyn DealSource>,
    timing: Option<Arc<dyn TimingAnalyzer>>,
    product_delay: Duration,
    deals_per_search: usize,
}

impl PricePoller {
    pub fn new(store: Arc<dyn TrackingStore>, source: Arc<dyn DealSource>) -> Self {
        Self {
            store,
            source,
            timing: None,
            product_delay: DEFAULT_PRODUCT_DELAY,
            deals_per_search: DEFAULT_DEALS_PER_SEARCH,
        }
    }

    pub fn with_timing(mut self, analyzer: Arc<dyn TimingAnalyzer>) -> Self {
        self.timing = Some(analyzer);
        self
    }

    pub fn with_product_delay(mut self, delay: Duration) -> Self {
        self.product_delay = delay;
        self
    }

    pub fn with_deals_per_search(mut self, count: usize) -> Self {
        self.deals_per_search = count.max(1);
        self
    }

    /// Check every product with alerts enabled once.
    pub async fn run_once(&self) -> PollReport {
        let mut report = PollReport::default();
        self.source.prepare().await;

        let products = match self.store.list_enabled_products().await {
            Ok(products) => products,
            Err(e) => {
                warn!("Could not list tracked products: {}", e);
                return report;
            }
        };
        info!("Checking prices for {} products", products.len());

        for (i, product) in products.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.product_delay).await;
            }

            report.checked += 1;
            match self.check_product(product).await {
                Ok(outcome) => {
                    report.price_alerts += usize::from(outcome.price_alert);
                    report.timing_alerts += usize::from(outcome.timing_alert);
                    report.synthetic += usize::from(outcome.synthetic);
                }
                Err(e) => {
                    warn!("Price check failed for {:?}: {}", product.name, e);
                    report.failed += 1;
                }
            }
        }

        info!("Price check finished: {}", report);
        report
    }

    async fn check_product(&self, product: &TrackedProduct) -> Result<ProductOutcome, ProductError> {
        let outcome = self.source.find(&product.name, self.deals_per_search).await?;
        let mut result = ProductOutcome {
            synthetic: outcome.is_synthetic(),
            ..Default::default()
        };

        let cheapest = outcome.cheapest().ok_or(ProductError::NoDeals)?;
        self.store
            .append_price_observation(&product.id, cheapest.retailer(), cheapest.price(), cheapest.url())
            .await?;
        debug!(
            "{}: cheapest ${:.2} at {} ({})",
            product.name,
            cheapest.price(),
            cheapest.retailer(),
            outcome.origin.as_str()
        );

        if cheapest.price() <= product.target_price {
            let message = price_alert_message(product, cheapest);
            result.price_alert = self.raise(product, AlertKind::PriceAlert, &message).await;
        }

        if let Some(analyzer) = &self.timing {
            match analyzer.analyze_timing(&product.name, &outcome.deals).await {
                Ok(analysis) if analysis.should_alert() => {
                    let message = timing_alert_message(product, &analysis);
                    result.timing_alert = self.raise(product, AlertKind::TimingAlert, &message).await;
                }
                Ok(analysis) => debug!(
                    "{}: timing {:?}/{:?}, no alert",
                    product.name, analysis.recommendation, analysis.confidence
                ),
                Err(e) => warn!("Timing analysis failed for {:?}: {}", product.name, e),
            }
        }

        Ok(result)
    }

    async fn raise(&self, product: &TrackedProduct, kind: AlertKind, message: &str) -> bool {
        match self.store.create_alert(&product.id, kind, message).await {
            Ok(()) => {
                info!("{}", message);
                true
            }
            Err(e) => {
                warn!("Could not save {} for {:?}: {}", kind, product.name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::{DealOrigin, SearchError, SearchOutcome};
    use crate::repository::MemoryStore;
    use crate::synthetic::GenerationError;
    use crate::timing::{Confidence, Recommendation, RiskLevel, TimingError};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Returns canned prices per product name.
    struct FixedSource(HashMap<&'static str, Vec<(&'static str, f64)>>);

    #[async_trait]
    impl DealSource for FixedSource {
        async fn find(&self, product: &str, _limit: usize) -> Result<SearchOutcome, SearchError> {
            match self.0.get(product) {
                Some(prices) => Ok(SearchOutcome {
                    deals: prices
                        .iter()
                        .map(|(retailer, price)| Deal::new(*retailer, *price, None, "https://shop.test/p").unwrap())
                        .collect(),
                    origin: DealOrigin::Live,
                }),
                None => Err(SearchError::Generation(GenerationError::Parse("broken".into()))),
            }
        }
    }

    struct FixedTiming(Option<(Recommendation, Confidence)>);

    #[async_trait]
    impl TimingAnalyzer for FixedTiming {
        async fn analyze_timing(&self, _product: &str, _deals: &[Deal]) -> Result<TimingAnalysis, TimingError> {
            let (recommendation, confidence) = self.0.ok_or_else(|| TimingError::Parse("bad".into()))?;
            Ok(TimingAnalysis {
                recommendation,
                confidence,
                reasoning: "Prices usually drop on Black Friday.".into(),
                expected_discount_pct: 20.0,
                risk_level: RiskLevel::Low,
            })
        }
    }

    async fn poller_with(
        cheapest: f64,
        timing: Option<FixedTiming>,
    ) -> (PricePoller, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.create_product("u", "Console", 500.0).await.unwrap();
        let source = FixedSource(HashMap::from([(
            "Console",
            vec![("Best Buy", cheapest), ("Amazon", cheapest + 25.0)],
        )]));
        let mut poller = PricePoller::new(store.clone(), Arc::new(source)).with_product_delay(Duration::ZERO);
        if let Some(timing) = timing {
            poller = poller.with_timing(Arc::new(timing));
        }
        (poller, store)
    }

    #[tokio::test]
    async fn test_price_below_target_alerts_once() {
        let (poller, store) = poller_with(450.0, None).await;
        let report = poller.run_once().await;

        assert_eq!(report.price_alerts, 1);
        let alerts = store.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PriceAlert);
        assert!(alerts[0].message.contains("450.00"));
        assert!(alerts[0].message.contains("Best Buy"));
        assert_eq!(
            alerts[0].message,
            "Price Alert! Console is now $450.00 at Best Buy (Target: $500.00)"
        );

        let observations = store.observations().await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].price, 450.0);
    }

    #[tokio::test]
    async fn test_price_above_target_records_without_alert() {
        let (poller, store) = poller_with(550.0, None).await;
        let report = poller.run_once().await;

        assert_eq!(report.price_alerts, 0);
        assert!(store.alerts().await.is_empty());
        assert_eq!(store.observations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_price_equal_to_target_alerts() {
        let (poller, _) = poller_with(500.0, None).await;
        assert_eq!(poller.run_once().await.price_alerts, 1);
    }

    #[tokio::test]
    async fn test_timing_alert_matrix() {
        let cases = [
            (Recommendation::Wait, Confidence::Medium, 0),
            (Recommendation::Wait, Confidence::High, 1),
            (Recommendation::BuyNow, Confidence::High, 0),
        ];
        for (recommendation, confidence, expected) in cases {
            let (poller, store) = poller_with(550.0, Some(FixedTiming(Some((recommendation, confidence))))).await;
            let report = poller.run_once().await;
            assert_eq!(report.timing_alerts, expected);

            let timing: Vec<_> = store
                .alerts()
                .await
                .into_iter()
                .filter(|a| a.kind == AlertKind::TimingAlert)
                .collect();
            assert_eq!(timing.len(), expected);
            if let Some(alert) = timing.first() {
                assert_eq!(
                    alert.message,
                    "Timing Alert! Consider waiting for Console. Prices usually drop on Black Friday."
                );
            }
        }
    }

    #[tokio::test]
    async fn test_timing_failure_keeps_price_alert() {
        let (poller, store) = poller_with(450.0, Some(FixedTiming(None))).await;
        let report = poller.run_once().await;
        assert_eq!(report.price_alerts, 1);
        assert_eq!(report.timing_alerts, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(store.alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_product_does_not_stop_batch() {
        let store = Arc::new(MemoryStore::new());
        store.create_product("u", "Broken", 100.0).await.unwrap();
        store.create_product("u", "Empty", 100.0).await.unwrap();
        store.create_product("u", "Lamp", 100.0).await.unwrap();
        let disabled = store.create_product("u", "Ignored", 100.0).await.unwrap();
        store.set_alert_enabled(&disabled, false).await.unwrap();

        let source = FixedSource(HashMap::from([("Empty", vec![]), ("Lamp", vec![("Walmart", 80.0)])]));
        let poller = PricePoller::new(store.clone(), Arc::new(source)).with_product_delay(Duration::ZERO);

        let report = poller.run_once().await;
        assert_eq!(
            report,
            PollReport {
                checked: 3,
                failed: 2,
                price_alerts: 1,
                timing_alerts: 0,
                synthetic: 0,
            }
        );
        assert!(store.alerts().await[0].message.contains("Walmart"));
    }
}
