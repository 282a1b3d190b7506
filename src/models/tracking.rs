//! Tracked products, their price history, and the alerts raised for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product a user asked to watch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_price: f64,
    pub created_at: DateTime<Utc>,
    pub alert_enabled: bool,
}

impl TrackedProduct {
    /// Create a new tracked product with a fresh id. Alerts start enabled.
    pub fn new(user_id: &str, name: &str, target_price: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            target_price,
            created_at: Utc::now(),
            alert_enabled: true,
        }
    }
}

/// One recorded price for a tracked product. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: String,
    pub product_id: String,
    pub retailer: String,
    pub price: f64,
    pub url: String,
    pub checked_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn new(product_id: &str, retailer: &str, price: f64, url: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            retailer: retailer.to_string(),
            price,
            url: url.to_string(),
            checked_at: Utc::now(),
        }
    }
}

/// Why an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PriceAlert,
    TimingAlert,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAlert => "price_alert",
            Self::TimingAlert => "timing_alert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "price_alert" => Some(Self::PriceAlert),
            "timing_alert" => Some(Self::TimingAlert),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert raised for a tracked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub product_id: String,
    pub kind: AlertKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl AlertEvent {
    pub fn new(product_id: &str, kind: AlertKind, message: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            kind,
            message: message.to_string(),
            created_at: Utc::now(),
            read: false,
        }
    }
}

/// An unread alert together with the name of the product it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotice {
    pub alert: AlertEvent,
    pub product_name: String,
}
