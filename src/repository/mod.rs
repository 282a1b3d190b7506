//! Persistence for tracked products, price history and alerts.
//!
//! The pipeline only talks to [`TrackingStore`]. [`SqliteStore`] is the
//! on-disk implementation; [`MemoryStore`] backs tests and dry runs.

mod memory;
mod models;
mod pool;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::{AlertKind, AlertNotice, PriceObservation, TrackedProduct};

pub use memory::MemoryStore;
pub use pool::{to_diesel_error, AsyncSqliteConnection, AsyncSqlitePool, DieselError};
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid value: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage used by the poller and the CLI.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Start tracking a product, returning its id.
    async fn create_product(&self, user_id: &str, name: &str, target_price: f64) -> Result<String>;

    async fn append_price_observation(
        &self,
        product_id: &str,
        retailer: &str,
        price: f64,
        url: &str,
    ) -> Result<()>;

    async fn create_alert(&self, product_id: &str, kind: AlertKind, message: &str) -> Result<()>;

    /// Every product with alerts enabled, across all users.
    async fn list_enabled_products(&self) -> Result<Vec<TrackedProduct>>;

    /// A user's products, newest first.
    async fn list_products(&self, user_id: &str) -> Result<Vec<TrackedProduct>>;

    async fn set_alert_enabled(&self, product_id: &str, enabled: bool) -> Result<()>;

    /// Recorded prices, newest first.
    async fn price_history(&self, product_id: &str) -> Result<Vec<PriceObservation>>;

    /// Unread alerts for a user's products, newest first.
    async fn unread_alerts(&self, user_id: &str) -> Result<Vec<AlertNotice>>;

    async fn mark_alert_read(&self, alert_id: &str) -> Result<()>;
}

pub(crate) fn validate_target(target_price: f64) -> Result<()> {
    if target_price.is_finite() && target_price > 0.0 {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("target price {}", target_price)))
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
