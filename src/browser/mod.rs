//! Shared browser session for fetching retailer pages.
//!
//! Retailer search pages are rendered client-side and guarded by bot
//! detection, so pages are loaded through one automated Chromium instance
//! with stealth patches. The [`FetchSession`] owns that instance, builds it
//! lazily, serializes access, and retries or rebuilds it on failure. When
//! the browser gives up, a plain [`HttpFetcher`] gets one try.

mod chromium;
mod config;
mod driver;
mod error;
mod http;
mod retry;
mod session;
mod stealth;
mod user_agent;

pub use chromium::ChromiumFactory;
pub use config::BrowserConfig;
pub use driver::{DriverFactory, PageDriver};
pub use error::FetchError;
pub use http::{browser_headers, HttpFetcher, DEFAULT_HTTP_TIMEOUT};
pub use retry::{is_dead_session, RetryAction, RetryPolicy};
pub use session::{FetchSession, PageFetcher, SessionState};
pub use user_agent::{platform_user_agent, resolve_user_agent};

/// Build the default Chromium-backed session from config, with a plain
/// HTTP fallback unless disabled.
pub fn chromium_session(config: &BrowserConfig) -> FetchSession {
    let factory = ChromiumFactory::new(config.clone());
    let fallback = if config.http_fallback {
        match HttpFetcher::new(factory.user_agent(), config.http_timeout()) {
            Ok(fetcher) => Some(fetcher),
            Err(e) => {
                tracing::warn!("Plain HTTP fallback disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let session = FetchSession::new(factory, RetryPolicy::from_config(config));
    match fallback {
        Some(fetcher) => session.with_fallback(fetcher),
        None => session,
    }
}
