//! Fetch session configuration.
//!
//! Always compiled (not behind the `browser` feature) so that config files
//! parse the same way whether or not Chromium support is built in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser and retry settings for the shared fetch session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page load timeout in seconds.
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout: u64,

    /// Maximum seconds to wait for the document to become ready after navigation.
    #[serde(default = "default_implicit_wait")]
    pub implicit_wait: u64,

    /// Explicit Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Override the platform-derived user agent.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Attempts per fetch before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Try a plain HTTP request when the browser gives up on a page.
    #[serde(default = "default_http_fallback")]
    pub http_fallback: bool,

    /// Timeout for the plain HTTP request in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,
}

fn default_headless() -> bool {
    true
}

fn default_page_load_timeout() -> u64 {
    30
}

fn default_implicit_wait() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_http_fallback() -> bool {
    true
}

fn default_http_timeout() -> u64 {
    10
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            page_load_timeout: default_page_load_timeout(),
            implicit_wait: default_implicit_wait(),
            chrome_path: None,
            chrome_args: Vec::new(),
            remote_url: None,
            user_agent: None,
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            http_fallback: default_http_fallback(),
            http_timeout: default_http_timeout(),
        }
    }
}

impl BrowserConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `BROWSER_HEADLESS`: "true" or "false"
    /// - `BROWSER_URL`: remote DevTools URL
    /// - `CHROME_PATH`: Chrome executable
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_HEADLESS") {
            self.headless = !(val.eq_ignore_ascii_case("false") || val == "0");
        }
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.trim().is_empty() {
                self.remote_url = Some(val);
            }
        }
        if let Ok(val) = std::env::var("CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(val));
        }
        self
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout)
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout.max(1))
    }
}
