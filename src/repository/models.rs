//! Diesel row types.

use diesel::prelude::*;

use super::parse_datetime;
use crate::models::{AlertEvent, AlertKind, PriceObservation, TrackedProduct};
use crate::schema;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductRecord {
    pub id: String,
    pub user_id: String,
    pub product_name: String,
    pub target_price: f64,
    pub created_at: String,
    pub alert_enabled: i32,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceRecord {
    pub id: String,
    pub product_id: String,
    pub retailer: String,
    pub price: f64,
    pub url: String,
    pub checked_at: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::alerts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertRecord {
    pub id: String,
    pub product_id: String,
    pub alert_type: String,
    pub message: String,
    pub created_at: String,
    pub read: i32,
}

impl From<ProductRecord> for TrackedProduct {
    fn from(record: ProductRecord) -> Self {
        TrackedProduct {
            id: record.id,
            user_id: record.user_id,
            name: record.product_name,
            target_price: record.target_price,
            created_at: parse_datetime(&record.created_at),
            alert_enabled: record.alert_enabled != 0,
        }
    }
}

impl From<PriceRecord> for PriceObservation {
    fn from(record: PriceRecord) -> Self {
        PriceObservation {
            id: record.id,
            product_id: record.product_id,
            retailer: record.retailer,
            price: record.price,
            url: record.url,
            checked_at: parse_datetime(&record.checked_at),
        }
    }
}

impl TryFrom<AlertRecord> for AlertEvent {
    type Error = super::StoreError;

    fn try_from(record: AlertRecord) -> Result<Self, Self::Error> {
        let kind = AlertKind::from_str(&record.alert_type)
            .ok_or_else(|| super::StoreError::Invalid(format!("alert type {}", record.alert_type)))?;
        Ok(AlertEvent {
            id: record.id,
            product_id: record.product_id,
            kind,
            message: record.message,
            created_at: parse_datetime(&record.created_at),
            read: record.read != 0,
        })
    }
}
