//! Buy-now-or-wait analysis for a product's current deals.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::json::json_payload;
use crate::llm::{LlmError, TextGenerator};
use crate::models::Deal;

const SYSTEM_PROMPT: &str = "You are a shopping strategy expert. Return only valid JSON.";
const TEMPERATURE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum TimingError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Malformed timing analysis: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    BuyNow,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Result of a timing analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingAnalysis {
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "expected_bf_discount")]
    pub expected_discount_pct: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl TimingAnalysis {
    /// Only a confident "wait" is worth interrupting the user for.
    pub fn should_alert(&self) -> bool {
        self.recommendation == Recommendation::Wait && self.confidence == Confidence::High
    }
}

#[async_trait]
pub trait TimingAnalyzer: Send + Sync {
    async fn analyze_timing(&self, product: &str, deals: &[Deal]) -> Result<TimingAnalysis, TimingError>;
}

/// Timing analysis backed by a text generator.
pub struct LlmTimingAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl LlmTimingAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl TimingAnalyzer for LlmTimingAnalyzer {
    async fn analyze_timing(&self, product: &str, deals: &[Deal]) -> Result<TimingAnalysis, TimingError> {
        let prompt = build_prompt(product, average_price(deals));
        let raw = self
            .generator
            .complete(SYSTEM_PROMPT, &prompt, TEMPERATURE)
            .await?;
        parse_analysis(&raw)
    }
}

pub(crate) fn average_price(deals: &[Deal]) -> f64 {
    if deals.is_empty() {
        return 0.0;
    }
    deals.iter().map(Deal::price).sum::<f64>() / deals.len() as f64
}

fn build_prompt(product: &str, average: f64) -> String {
    format!(
        r#"Analyze whether a buyer should purchase {product} now (Thanksgiving week) or wait for Black Friday/Cyber Monday.

Current average price: ${average:.2}
Current date context: Mid-November, Thanksgiving week

Consider:
1. Historical pricing patterns for this product category
2. Typical Black Friday/Cyber Monday discounts
3. Stock availability risks
4. Product category trends

Return a JSON object with:
{{
    "recommendation": "buy_now" or "wait",
    "confidence": "high", "medium", or "low",
    "reasoning": "brief explanation",
    "expected_bf_discount": estimated percentage (0-50),
    "risk_level": "low", "medium", or "high" (for stock-outs)
}}

Return ONLY valid JSON."#
    )
}

pub(crate) fn parse_analysis(raw: &str) -> Result<TimingAnalysis, TimingError> {
    serde_json::from_str(json_payload(raw)).map_err(|e| TimingError::Parse(e.to_string()))
}
