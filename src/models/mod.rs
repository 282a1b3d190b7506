//! Data models for dealwatch.

mod deal;
mod tracking;

pub use deal::{
    discount_percentage, sort_by_price, Availability, Deal, DealError, DealQuality,
    MAX_TITLE_CHARS,
};
pub use tracking::{AlertEvent, AlertKind, AlertNotice, PriceObservation, TrackedProduct};
