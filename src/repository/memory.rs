//! In-memory tracking store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_target, Result, StoreError, TrackingStore};
use crate::models::{AlertEvent, AlertKind, AlertNotice, PriceObservation, TrackedProduct};

#[derive(Default)]
struct Tables {
    products: Vec<TrackedProduct>,
    prices: Vec<PriceObservation>,
    alerts: Vec<AlertEvent>,
}

/// Tracking store kept entirely in memory. Rows are held in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every alert ever raised, oldest first.
    pub async fn alerts(&self) -> Vec<AlertEvent> {
        self.tables.read().await.alerts.clone()
    }

    /// Every observation ever recorded, oldest first.
    pub async fn observations(&self) -> Vec<PriceObservation> {
        self.tables.read().await.prices.clone()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn create_product(&self, user_id: &str, name: &str, target_price: f64) -> Result<String> {
        validate_target(target_price)?;
        let product = TrackedProduct::new(user_id, name, target_price);
        let id = product.id.clone();
        self.tables.write().await.products.push(product);
        Ok(id)
    }

    async fn append_price_observation(
        &self,
        product_id: &str,
        retailer: &str,
        price: f64,
        url: &str,
    ) -> Result<()> {
        let observation = PriceObservation::new(product_id, retailer, price, url);
        self.tables.write().await.prices.push(observation);
        Ok(())
    }

    async fn create_alert(&self, product_id: &str, kind: AlertKind, message: &str) -> Result<()> {
        let alert = AlertEvent::new(product_id, kind, message);
        self.tables.write().await.alerts.push(alert);
        Ok(())
    }

    async fn list_enabled_products(&self) -> Result<Vec<TrackedProduct>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.alert_enabled)
            .cloned()
            .collect())
    }

    async fn list_products(&self, user_id: &str) -> Result<Vec<TrackedProduct>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_alert_enabled(&self, product_id: &str, enabled: bool) -> Result<()> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| StoreError::NotFound(format!("product {}", product_id)))?;
        product.alert_enabled = enabled;
        Ok(())
    }

    async fn price_history(&self, product_id: &str) -> Result<Vec<PriceObservation>> {
        let tables = self.tables.read().await;
        if !tables.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::NotFound(format!("product {}", product_id)));
        }
        Ok(tables
            .prices
            .iter()
            .rev()
            .filter(|o| o.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn unread_alerts(&self, user_id: &str) -> Result<Vec<AlertNotice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .alerts
            .iter()
            .rev()
            .filter(|a| !a.read)
            .filter_map(|alert| {
                tables
                    .products
                    .iter()
                    .find(|p| p.id == alert.product_id && p.user_id == user_id)
                    .map(|p| AlertNotice {
                        alert: alert.clone(),
                        product_name: p.name.clone(),
                    })
            })
            .collect())
    }

    async fn mark_alert_read(&self, alert_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| StoreError::NotFound(format!("alert {}", alert_id)))?;
        alert.read = true;
        Ok(())
    }
}
