//! End-to-end runs of search, poll and alert through stub collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealwatch::browser::{DriverFactory, FetchError, FetchSession, PageDriver, PageFetcher, RetryPolicy, SessionState};
use dealwatch::llm::{LlmError, TextGenerator};
use dealwatch::models::AlertKind;
use dealwatch::repository::{MemoryStore, SqliteStore, TrackingStore};
use dealwatch::synthetic::SyntheticDealGenerator;
use dealwatch::timing::LlmTimingAnalyzer;
use dealwatch::{DealAggregator, DealFinder, DealOrigin, DealSource, PricePoller, Scheduler};

const BESTBUY_PAGE: &str = r#"<html><body><ul>
  <li class="sku-item">
    <h4 class="sku-title"><a href="/site/sony-wh1000xm5/6505727.p">Sony WH-1000XM5 Wireless Headphones</a></h4>
    <div data-testid="customer-price"><span>$329.99</span></div>
    <div data-testid="regular-price"><span>Was $399.99</span></div>
    <a class="product-list-item-link" href="/site/sony-wh1000xm5/6505727.p">view</a>
  </li>
</ul></body></html>"#;

const AMAZON_PAGE: &str = r#"<html><head><script type="application/ld+json">
{"@type": "ItemList", "itemListElement": [
  {"@type": "Product", "name": "Sony WH-1000XM5", "url": "/dp/B09XS7JWHH",
   "offers": {"price": "348.00", "availability": "https://schema.org/InStock"}}
]}
</script></head><body></body></html>"#;

/// Serves fixture pages by host, failing everything else.
struct FixturePages {
    fetches: AtomicUsize,
    walmart_down: bool,
}

#[async_trait]
impl PageFetcher for FixturePages {
    async fn fetch(&self, url: &str, _wait: Duration) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if url.contains("amazon.com") {
            Ok(AMAZON_PAGE.to_string())
        } else if url.contains("bestbuy.com") {
            Ok(BESTBUY_PAGE.to_string())
        } else if self.walmart_down {
            Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: 3,
                last: "net::ERR_CONNECTION_RESET".to_string(),
            })
        } else {
            Ok("<html><body>Robot check</body></html>".to_string())
        }
    }
}

struct Offline;

#[async_trait]
impl PageFetcher for Offline {
    async fn fetch(&self, url: &str, _wait: Duration) -> Result<String, FetchError> {
        Err(FetchError::SessionUnavailable(format!("no browser for {}", url)))
    }
}

/// Answers deal prompts with a fenced list and timing prompts with "wait".
struct ScriptedModel {
    deal_calls: AtomicUsize,
    timing_calls: AtomicUsize,
}

impl ScriptedModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            deal_calls: AtomicUsize::new(0),
            timing_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn complete(&self, _system: &str, user: &str, _temperature: f32) -> Result<String, LlmError> {
        if user.contains("Black Friday/Cyber Monday.") {
            self.timing_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(r#"{"recommendation": "wait", "confidence": "high",
                "reasoning": "Headphones drop sharply on Black Friday.",
                "expected_bf_discount": 30, "risk_level": "low"}"#
                .to_string());
        }
        self.deal_calls.fetch_add(1, Ordering::SeqCst);
        Ok("```json\n[\
            {\"retailer\": \"Target\", \"price\": 279.99, \"original_price\": 399.99, \"availability\": \"In Stock\"},\
            {\"retailer\": \"Walmart\", \"price\": 299.0, \"original_price\": 349.0}\
        ]\n```"
            .to_string())
    }
}

fn finder(fetcher: Arc<dyn PageFetcher>, model: Arc<ScriptedModel>) -> DealFinder {
    let aggregator = DealAggregator::new(fetcher).with_retailer_delay(Duration::ZERO);
    DealFinder::new(aggregator).with_generator(SyntheticDealGenerator::new(model))
}

#[tokio::test]
async fn live_search_survives_failing_retailer() {
    let fetcher = Arc::new(FixturePages {
        fetches: AtomicUsize::new(0),
        walmart_down: true,
    });
    let model = ScriptedModel::new();
    let finder = finder(fetcher.clone(), model.clone());

    let outcome = finder.find("Sony WH-1000XM5", 5).await.unwrap();
    assert_eq!(outcome.origin, DealOrigin::Live);
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(model.deal_calls.load(Ordering::SeqCst), 0);

    let summary: Vec<(&str, f64)> = outcome.deals.iter().map(|d| (d.retailer(), d.price())).collect();
    assert_eq!(summary, vec![("Best Buy", 329.99), ("Amazon", 348.0)]);
    assert_eq!(outcome.deals[0].discount_percentage(), 18);
}

#[tokio::test]
async fn offline_search_falls_back_once() {
    let model = ScriptedModel::new();
    let finder = finder(Arc::new(Offline), model.clone());

    let outcome = finder.find("Sony WH-1000XM5", 5).await.unwrap();
    assert_eq!(outcome.origin, DealOrigin::Synthetic);
    assert_eq!(model.deal_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.cheapest().unwrap().retailer(), "Target");
    assert_eq!(outcome.deals[0].discount_percentage(), 30);
}

#[tokio::test]
async fn poll_run_records_and_alerts() {
    let store = Arc::new(MemoryStore::new());
    let cheap = store.create_product("sam", "Sony WH-1000XM5", 350.0).await.unwrap();
    let pricey = store.create_product("sam", "Sony WH-1000XM5", 300.0).await.unwrap();

    let model = ScriptedModel::new();
    let fetcher = Arc::new(FixturePages {
        fetches: AtomicUsize::new(0),
        walmart_down: false,
    });
    let poller = PricePoller::new(store.clone(), Arc::new(finder(fetcher, model.clone())))
        .with_timing(Arc::new(LlmTimingAnalyzer::new(model.clone())))
        .with_product_delay(Duration::ZERO);

    let report = poller.run_once().await;
    assert_eq!(report.checked, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.price_alerts, 1);
    assert_eq!(report.timing_alerts, 2);
    assert_eq!(model.timing_calls.load(Ordering::SeqCst), 2);

    let history = store.price_history(&cheap).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].price, 329.99);
    assert_eq!(history[0].retailer, "Best Buy");

    let unread = store.unread_alerts("sam").await.unwrap();
    let price_alerts: Vec<_> = unread
        .iter()
        .filter(|n| n.alert.kind == AlertKind::PriceAlert)
        .collect();
    assert_eq!(price_alerts.len(), 1);
    assert_eq!(price_alerts[0].alert.product_id, cheap);
    assert!(price_alerts[0].alert.message.contains("329.99"));
    assert!(price_alerts[0].alert.message.contains("Best Buy"));
    assert!(unread
        .iter()
        .filter(|n| n.alert.product_id == pricey)
        .all(|n| n.alert.kind == AlertKind::TimingAlert));
}

#[tokio::test]
async fn scheduled_poll_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("deals.db")).await.unwrap());
    let id = store.create_product("sam", "Sony WH-1000XM5", 400.0).await.unwrap();

    let model = ScriptedModel::new();
    let poller = Arc::new(
        PricePoller::new(store.clone(), Arc::new(finder(Arc::new(Offline), model.clone())))
            .with_product_delay(Duration::ZERO),
    );

    let handle = Scheduler::new(Duration::from_secs(3600)).start(poller);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(handle.stop().await, 1);

    let history = store.price_history(&id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].retailer, "Target");

    let unread = store.unread_alerts("sam").await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].product_name, "Sony WH-1000XM5");
    assert_eq!(
        unread[0].alert.message,
        "Price Alert! Sony WH-1000XM5 is now $279.99 at Target (Target: $400.00)"
    );
}

/// Browser backend whose first launch fails; later launches serve fixtures.
struct FlakyLaunch {
    launches: AtomicUsize,
}

struct FixtureDriver;

#[async_trait]
impl PageDriver for FixtureDriver {
    async fn load(&mut self, url: &str, _settle: Duration) -> Result<String, FetchError> {
        if url.contains("bestbuy.com") {
            Ok(BESTBUY_PAGE.to_string())
        } else {
            Ok("<html><body></body></html>".to_string())
        }
    }

    async fn quit(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

#[async_trait]
impl DriverFactory for FlakyLaunch {
    async fn create(&self) -> Result<Box<dyn PageDriver>, FetchError> {
        if self.launches.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(FetchError::Launch("transient".to_string()));
        }
        Ok(Box::new(FixtureDriver))
    }
}

#[tokio::test]
async fn failed_launch_recovers_on_next_run() {
    let store = Arc::new(MemoryStore::new());
    let id = store.create_product("sam", "Sony WH-1000XM5", 400.0).await.unwrap();

    let session = Arc::new(FetchSession::new(
        FlakyLaunch {
            launches: AtomicUsize::new(0),
        },
        RetryPolicy::immediate(3),
    ));
    let aggregator = DealAggregator::new(session.clone()).with_retailer_delay(Duration::ZERO);
    let poller = PricePoller::new(store.clone(), Arc::new(DealFinder::new(aggregator)))
        .with_product_delay(Duration::ZERO);

    let first = poller.run_once().await;
    assert_eq!(first.failed, 1);
    assert!(matches!(session.state().await, SessionState::Broken(_)));

    let second = poller.run_once().await;
    assert_eq!(second.failed, 0);
    assert_eq!(second.price_alerts, 1);
    assert_eq!(session.state().await, SessionState::Ready);

    let history = store.price_history(&id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].retailer, "Best Buy");
}
