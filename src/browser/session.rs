//! The single shared fetch session.
//!
//! One automation handle serves every caller. Access goes through a mutex
//! held for the whole attempt loop of a fetch, so navigations never overlap.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::driver::{DriverFactory, PageDriver};
use super::error::FetchError;
use super::retry::{RetryAction, RetryPolicy};

/// Lifecycle state of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    /// Construction failed; every fetch fails immediately.
    Broken(String),
}

enum Slot {
    Uninitialized,
    Ready(Box<dyn PageDriver>),
    Broken(String),
}

/// Anything that can turn a URL into rendered page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, wait: Duration) -> Result<String, FetchError>;

    /// Clear failure state kept from an earlier run.
    async fn recover(&self) {}
}

/// Mutex-guarded owner of the automation handle.
pub struct FetchSession {
    factory: Box<dyn DriverFactory>,
    policy: RetryPolicy,
    slot: Mutex<Slot>,
    fallback: Option<Box<dyn PageFetcher>>,
}

impl FetchSession {
    /// Create a session. The handle is built lazily on the first fetch.
    pub fn new(factory: impl DriverFactory + 'static, policy: RetryPolicy) -> Self {
        Self {
            factory: Box::new(factory),
            policy,
            slot: Mutex::new(Slot::Uninitialized),
            fallback: None,
        }
    }

    /// Fetcher tried when the browser gives up on a page or cannot start.
    pub fn with_fallback(mut self, fetcher: impl PageFetcher + 'static) -> Self {
        self.fallback = Some(Box::new(fetcher));
        self
    }

    pub async fn state(&self) -> SessionState {
        match &*self.slot.lock().await {
            Slot::Uninitialized => SessionState::Uninitialized,
            Slot::Ready(_) => SessionState::Ready,
            Slot::Broken(reason) => SessionState::Broken(reason.clone()),
        }
    }

    /// Fetch a page through the browser, then through the fallback fetcher
    /// if the browser gave up.
    pub async fn fetch(&self, url: &str, wait: Duration) -> Result<String, FetchError> {
        let error = match self.fetch_rendered(url, wait).await {
            Ok(content) => return Ok(content),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(error);
        };
        if !matches!(
            error,
            FetchError::Exhausted { .. } | FetchError::SessionUnavailable(_)
        ) {
            return Err(error);
        }

        info!("Browser could not load {}, trying plain HTTP", url);
        match fallback.fetch(url, wait).await {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!("Plain HTTP fetch of {} failed: {}", url, e);
                Err(error)
            }
        }
    }

    /// Fetch a page through the browser, retrying per the session's policy.
    pub async fn fetch_rendered(&self, url: &str, wait: Duration) -> Result<String, FetchError> {
        let mut slot = self.slot.lock().await;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let driver = self.ensure_driver(&mut slot).await?;

            debug!("Fetching {} (attempt {}/{})", url, attempt, self.policy.max_attempts);
            let error = match driver.load(url, wait).await {
                Ok(content) => return Ok(content),
                Err(e) => e,
            };

            warn!("Fetch attempt {} for {} failed: {}", attempt, url, error);
            match self.policy.classify(attempt, &error) {
                RetryAction::GiveUp => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: error.to_string(),
                    });
                }
                RetryAction::ResetAndRetry => {
                    info!("Browser session looks dead, rebuilding");
                    if let Err(e) = Self::teardown(&mut slot).await {
                        warn!("Failed to tear down browser session: {}", e);
                        *slot = Slot::Broken(e.to_string());
                        return Err(FetchError::SessionUnavailable(e.to_string()));
                    }
                }
                RetryAction::Retry => {}
            }

            tokio::time::sleep(self.policy.delay_for(attempt)).await;
        }
    }

    /// Shut the handle down. The next fetch builds a new one.
    pub async fn shutdown(&self) -> Result<(), FetchError> {
        let mut slot = self.slot.lock().await;
        Self::teardown(&mut slot).await
    }

    /// Leave the Broken state so the next fetch tries to build a handle
    /// again. Returns whether the session was broken.
    pub async fn reset(&self) -> bool {
        let mut slot = self.slot.lock().await;
        if let Slot::Broken(reason) = &*slot {
            info!("Clearing broken browser session ({})", reason);
            *slot = Slot::Uninitialized;
            return true;
        }
        false
    }

    async fn ensure_driver<'a>(
        &self,
        slot: &'a mut Slot,
    ) -> Result<&'a mut Box<dyn PageDriver>, FetchError> {
        if let Slot::Uninitialized = slot {
            info!("Starting browser session ({})", self.factory.describe());
            match self.factory.create().await {
                Ok(driver) => *slot = Slot::Ready(driver),
                Err(e) => {
                    warn!("Browser session could not be started: {}", e);
                    *slot = Slot::Broken(e.to_string());
                }
            }
        }

        match slot {
            Slot::Ready(driver) => Ok(driver),
            Slot::Broken(reason) => Err(FetchError::SessionUnavailable(reason.clone())),
            Slot::Uninitialized => Err(FetchError::SessionUnavailable(
                "session not initialized".to_string(),
            )),
        }
    }

    async fn teardown(slot: &mut Slot) -> Result<(), FetchError> {
        match std::mem::replace(slot, Slot::Uninitialized) {
            Slot::Ready(mut driver) => driver.quit().await,
            Slot::Broken(reason) => {
                *slot = Slot::Broken(reason);
                Ok(())
            }
            Slot::Uninitialized => Ok(()),
        }
    }
}

#[async_trait]
impl PageFetcher for FetchSession {
    async fn fetch(&self, url: &str, wait: Duration) -> Result<String, FetchError> {
        FetchSession::fetch(self, url, wait).await
    }

    async fn recover(&self) {
        self.reset().await;
    }
}
