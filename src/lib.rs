//! dealwatch - retail price discovery, tracking and alerting.
//!
//! Searches retailers through one shared browser session, falls back to
//! generated estimates when every retailer comes back empty, and checks
//! tracked products on a schedule, raising price and timing alerts.

pub mod aggregator;
pub mod browser;
pub mod cli;
pub mod config;
pub mod finder;
pub mod llm;
pub mod models;
pub mod poller;
pub mod repository;
pub mod retailers;
pub mod scheduler;
pub mod schema;
pub mod synthetic;
pub mod timing;

pub use aggregator::DealAggregator;
pub use finder::{DealFinder, DealOrigin, DealSource, SearchError, SearchOutcome};
pub use models::{Deal, TrackedProduct};
pub use poller::{PollReport, PricePoller};
pub use scheduler::{Scheduler, SchedulerHandle};
