//! Generated deals for when no retailer returns anything.
//!
//! The output is plausible, not real. Callers mark it as synthetic and it
//! is only consulted after a live search came back empty.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::json::json_payload;
use crate::llm::{LlmError, TextGenerator};
use crate::models::{sort_by_price, Availability, Deal};

const SYSTEM_PROMPT: &str = "You are a helpful shopping assistant that returns only valid JSON.";

/// Default sampling temperature for generated deals.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Errors from the synthetic deal path.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The model answered, but not with the expected JSON shape.
    #[error("Could not parse generated deals: {0}")]
    Parse(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// One deal as the model writes it. Derived fields are ignored.
#[derive(Debug, Deserialize)]
struct GeneratedDeal {
    retailer: String,
    price: f64,
    #[serde(default)]
    original_price: Option<f64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    availability: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedPayload {
    List(Vec<GeneratedDeal>),
    Wrapped { deals: Vec<GeneratedDeal> },
}

/// Asks a text generator for deals and turns the reply into [`Deal`]s.
pub struct SyntheticDealGenerator {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl SyntheticDealGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Generate up to `count` deals for `product`, cheapest first.
    pub async fn generate(&self, product: &str, count: usize) -> Result<Vec<Deal>, GenerationError> {
        let prompt = build_prompt(product, count);
        let raw = self
            .generator
            .complete(SYSTEM_PROMPT, &prompt, self.temperature)
            .await?;
        debug!("Generator returned {} bytes for {:?}", raw.len(), product);

        let mut deals = parse_deals(&raw)?;
        sort_by_price(&mut deals);
        deals.truncate(count);
        Ok(deals)
    }
}

fn build_prompt(product: &str, count: usize) -> String {
    format!(
        r#"You are a deal-finding assistant. Generate realistic Thanksgiving/Black Friday deal information for: {product}

Return a JSON array with {count} deals from different retailers. Each deal should have:
- retailer: store name (Amazon, Walmart, Target, Best Buy, etc.)
- title: product listing title
- price: current price (realistic numbers)
- original_price: original price before discount
- url: example URL (use https://example.com/product)
- availability: "In Stock" or "Limited Stock"

Make the prices realistic and varied. Include a mix of good and average deals.

Return ONLY valid JSON, no other text."#
    )
}

/// Parse model output into deals, recomputing discount and tier.
///
/// Records whose price is not positive are dropped.
pub(crate) fn parse_deals(raw: &str) -> Result<Vec<Deal>, GenerationError> {
    let payload = json_payload(raw);
    let generated = match serde_json::from_str::<GeneratedPayload>(payload)
        .map_err(|e| GenerationError::Parse(e.to_string()))?
    {
        GeneratedPayload::List(deals) => deals,
        GeneratedPayload::Wrapped { deals } => deals,
    };

    let mut deals = Vec::with_capacity(generated.len());
    for record in generated {
        let url = record
            .url
            .unwrap_or_else(|| "https://example.com/product".to_string());
        let deal = match Deal::new(record.retailer, record.price, record.original_price, url) {
            Ok(deal) => deal,
            Err(e) => {
                warn!("Dropping generated deal: {}", e);
                continue;
            }
        };
        let availability = record
            .availability
            .as_deref()
            .map(parse_availability)
            .unwrap_or_default();
        let deal = deal.with_availability(availability);
        deals.push(match record.title {
            Some(title) => deal.with_title(&title),
            None => deal,
        });
    }
    Ok(deals)
}

fn parse_availability(s: &str) -> Availability {
    match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
        "limited stock" | "limited" => Availability::LimitedStock,
        "out of stock" | "sold out" => Availability::OutOfStock,
        _ => Availability::InStock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DealQuality;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<(String, f32)>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, LlmError> {
            assert_eq!(system, SYSTEM_PROMPT);
            self.prompts.lock().unwrap().push((user.to_string(), temperature));
            self.reply
                .clone()
                .map_err(|_| LlmError::Connection("refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fenced_reply_parses() {
        let canned = Canned::new(
            "```json\n[\
             {\"retailer\": \"Target\", \"price\": 320, \"original_price\": 400, \"availability\": \"Limited Stock\"},\
             {\"retailer\": \"Amazon\", \"price\": 299.99, \"original_price\": 349.99}\
             ]\n```",
        );
        let generator = SyntheticDealGenerator::new(canned.clone());

        let deals = generator.generate("Switch OLED", 5).await.unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].retailer(), "Amazon");
        assert_eq!(deals[1].availability(), Availability::LimitedStock);
        assert_eq!(deals[1].discount_percentage(), 20);

        let prompts = canned.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Switch OLED"));
        assert_eq!(prompts[0].1, DEFAULT_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_garbage_is_parse_failure() {
        let generator = SyntheticDealGenerator::new(Canned::new("I could not find any deals, sorry."));
        let err = generator.generate("tv", 3).await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));
    }

    #[tokio::test]
    async fn test_llm_error_passes_through() {
        let canned = Arc::new(Canned {
            reply: Err(()),
            prompts: Mutex::new(Vec::new()),
        });
        let err = SyntheticDealGenerator::new(canned)
            .generate("tv", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Llm(LlmError::Connection(_))));
    }

    #[test]
    fn test_model_discount_is_ignored() {
        let deals = parse_deals(
            r#"[{"retailer": "Walmart", "price": 50, "original_price": 100,
                 "discount_percentage": 10, "deal_quality": "Fair"}]"#,
        )
        .unwrap();
        assert_eq!(deals[0].discount_percentage(), 50);
        assert_eq!(deals[0].quality(), DealQuality::Excellent);
        assert_eq!(deals[0].url(), "https://example.com/product");
    }

    #[test]
    fn test_bad_prices_dropped_and_original_raised() {
        let deals = parse_deals(
            r#"{"deals": [
                {"retailer": "A", "price": 0},
                {"retailer": "B", "price": -5, "original_price": 10},
                {"retailer": "C", "price": 80, "original_price": 60}
            ]}"#,
        )
        .unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].original_price(), 80.0);
        assert_eq!(deals[0].discount_percentage(), 0);
    }

    #[tokio::test]
    async fn test_cheapest_kept_when_truncating() {
        let generator = SyntheticDealGenerator::new(Canned::new(
            r#"[{"retailer": "A", "price": 3}, {"retailer": "B", "price": 2}, {"retailer": "C", "price": 1}]"#,
        ));
        let deals = generator.generate("tv", 2).await.unwrap();
        let retailers: Vec<&str> = deals.iter().map(Deal::retailer).collect();
        assert_eq!(retailers, vec!["C", "B"]);
    }
}
