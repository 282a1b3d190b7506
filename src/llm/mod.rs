//! Text generation collaborator.
//!
//! The pipeline only needs `complete(system, user, temperature) -> text`;
//! prompts ask for strict JSON and the caller parses the reply itself.

mod client;
mod config;
pub mod json;

use async_trait::async_trait;
use thiserror::Error;

pub use client::LlmClient;
pub use config::{LlmConfig, LlmProvider};

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("LLM is disabled")]
    Disabled,
}

/// Produces raw text for a system and user prompt pair.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError>;
}
