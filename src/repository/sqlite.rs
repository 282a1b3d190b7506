//! SQLite-backed tracking store.

use std::path::Path;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::debug;

use super::models::{AlertRecord, PriceRecord, ProductRecord};
use super::pool::AsyncSqlitePool;
use super::{format_datetime, validate_target, Result, StoreError, TrackingStore};
use crate::models::{AlertEvent, AlertKind, AlertNotice, PriceObservation, TrackedProduct};
use crate::schema::{alerts, price_history, products};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    product_name TEXT NOT NULL,
    target_price REAL NOT NULL,
    created_at TEXT NOT NULL,
    alert_enabled INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS price_history (
    id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES products(id),
    retailer TEXT NOT NULL,
    price REAL NOT NULL,
    url TEXT NOT NULL,
    checked_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES products(id),
    alert_type TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_products_user ON products(user_id);
CREATE INDEX IF NOT EXISTS idx_price_history_product ON price_history(product_id, checked_at);
CREATE INDEX IF NOT EXISTS idx_alerts_product ON alerts(product_id, read);
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: AsyncSqlitePool,
}

impl SqliteStore {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `path` and create any missing tables.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Invalid(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let store = Self::new(AsyncSqlitePool::from_path(path));
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA).await?;
        debug!("Schema ready at {}", self.pool.database_url());
        Ok(())
    }

    async fn product_exists(&self, product_id: &str) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let count: i64 = products::table
            .filter(products::id.eq(product_id))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl TrackingStore for SqliteStore {
    async fn create_product(&self, user_id: &str, name: &str, target_price: f64) -> Result<String> {
        validate_target(target_price)?;
        let product = TrackedProduct::new(user_id, name, target_price);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products::table)
            .values((
                products::id.eq(&product.id),
                products::user_id.eq(&product.user_id),
                products::product_name.eq(&product.name),
                products::target_price.eq(product.target_price),
                products::created_at.eq(format_datetime(&product.created_at)),
                products::alert_enabled.eq(1),
            ))
            .execute(&mut conn)
            .await?;

        Ok(product.id)
    }

    async fn append_price_observation(
        &self,
        product_id: &str,
        retailer: &str,
        price: f64,
        url: &str,
    ) -> Result<()> {
        let observation = PriceObservation::new(product_id, retailer, price, url);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(price_history::table)
            .values((
                price_history::id.eq(&observation.id),
                price_history::product_id.eq(&observation.product_id),
                price_history::retailer.eq(&observation.retailer),
                price_history::price.eq(observation.price),
                price_history::url.eq(&observation.url),
                price_history::checked_at.eq(format_datetime(&observation.checked_at)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn create_alert(&self, product_id: &str, kind: AlertKind, message: &str) -> Result<()> {
        let alert = AlertEvent::new(product_id, kind, message);
        let mut conn = self.pool.get().await?;

        diesel::insert_into(alerts::table)
            .values((
                alerts::id.eq(&alert.id),
                alerts::product_id.eq(&alert.product_id),
                alerts::alert_type.eq(alert.kind.as_str()),
                alerts::message.eq(&alert.message),
                alerts::created_at.eq(format_datetime(&alert.created_at)),
                alerts::read.eq(0),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn list_enabled_products(&self) -> Result<Vec<TrackedProduct>> {
        let mut conn = self.pool.get().await?;

        let records = products::table
            .filter(products::alert_enabled.eq(1))
            .order(products::created_at.asc())
            .select(ProductRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(TrackedProduct::from).collect())
    }

    async fn list_products(&self, user_id: &str) -> Result<Vec<TrackedProduct>> {
        let mut conn = self.pool.get().await?;

        let records = products::table
            .filter(products::user_id.eq(user_id))
            .order(products::created_at.desc())
            .select(ProductRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(TrackedProduct::from).collect())
    }

    async fn set_alert_enabled(&self, product_id: &str, enabled: bool) -> Result<()> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(products::table.find(product_id))
            .set(products::alert_enabled.eq(i32::from(enabled)))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("product {}", product_id)));
        }
        Ok(())
    }

    async fn price_history(&self, product_id: &str) -> Result<Vec<PriceObservation>> {
        if !self.product_exists(product_id).await? {
            return Err(StoreError::NotFound(format!("product {}", product_id)));
        }
        let mut conn = self.pool.get().await?;

        let records = price_history::table
            .filter(price_history::product_id.eq(product_id))
            .order(price_history::checked_at.desc())
            .select(PriceRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(PriceObservation::from).collect())
    }

    async fn unread_alerts(&self, user_id: &str) -> Result<Vec<AlertNotice>> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(AlertRecord, String)> = alerts::table
            .inner_join(products::table)
            .filter(products::user_id.eq(user_id))
            .filter(alerts::read.eq(0))
            .order(alerts::created_at.desc())
            .select((AlertRecord::as_select(), products::product_name))
            .load(&mut conn)
            .await?;

        rows.into_iter()
            .map(|(record, product_name)| -> Result<AlertNotice> {
                Ok(AlertNotice {
                    alert: AlertEvent::try_from(record)?,
                    product_name,
                })
            })
            .collect()
    }

    async fn mark_alert_read(&self, alert_id: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(alerts::table.find(alert_id))
            .set(alerts::read.eq(1))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("alert {}", alert_id)));
        }
        Ok(())
    }
}
