//! Seams between the fetch session and the automation backend.

use std::time::Duration;

use async_trait::async_trait;

use super::error::FetchError;

/// A live automation handle able to render pages.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url`, let dynamic content settle for `settle`, and
    /// return the rendered page source.
    async fn load(&mut self, url: &str, settle: Duration) -> Result<String, FetchError>;

    /// Shut the handle down.
    async fn quit(&mut self) -> Result<(), FetchError>;
}

/// Builds automation handles on demand.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PageDriver>, FetchError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "driver".to_string()
    }
}
