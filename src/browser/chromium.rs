//! Chromium-backed page driver.
//!
//! Uses chromiumoxide (CDP). Without the `browser` feature the factory
//! always fails, leaving the fetch session broken and the pipeline in
//! fallback-only mode.

#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig as CdpConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

use super::config::BrowserConfig;
use super::driver::{DriverFactory, PageDriver};
use super::error::FetchError;
#[cfg(feature = "browser")]
use super::stealth::{READY_STATE_SCRIPT, STEALTH_SCRIPTS};
use super::user_agent::resolve_user_agent;

/// Launches (or connects to) Chromium for the fetch session.
pub struct ChromiumFactory {
    config: BrowserConfig,
    user_agent: String,
}

impl ChromiumFactory {
    pub fn new(config: BrowserConfig) -> Self {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());
        Self { config, user_agent }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(feature = "browser")]
impl ChromiumFactory {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    fn find_chrome(&self) -> Result<PathBuf, FetchError> {
        if let Some(ref path) = self.config.chrome_path {
            return Ok(path.clone());
        }

        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &["google-chrome", "chromium", "chromium-browser"] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        debug!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(FetchError::Launch(
            "Chrome/Chromium not found. Install it or set CHROME_PATH".to_string(),
        ))
    }

    async fn launch(&self) -> Result<ChromiumDriver, FetchError> {
        let chrome_path = self.find_chrome()?;
        info!(
            "Launching browser (headless={}) from {}",
            self.config.headless,
            chrome_path.display()
        );

        let mut builder = CdpConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(self.config.page_load_timeout());

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent));

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| FetchError::Launch(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(self.driver(browser, handler))
    }

    async fn connect_remote(&self, url: &str) -> Result<ChromiumDriver, FetchError> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| FetchError::Launch(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| FetchError::Launch(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FetchError::Launch("No webSocketDebuggerUrl in response".into()))?;

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: self.config.page_load_timeout(),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(self.driver(browser, handler))
    }

    fn driver(&self, browser: Browser, handler: tokio::task::JoinHandle<()>) -> ChromiumDriver {
        ChromiumDriver {
            browser,
            handler,
            options: RenderOptions {
                user_agent: self.user_agent.clone(),
                page_load_timeout: self.config.page_load_timeout(),
                implicit_wait: self.config.implicit_wait(),
            },
        }
    }
}

#[async_trait]
impl DriverFactory for ChromiumFactory {
    #[cfg(feature = "browser")]
    async fn create(&self) -> Result<Box<dyn PageDriver>, FetchError> {
        let driver = match self.config.remote_url.as_deref() {
            Some(url) => self.connect_remote(url).await?,
            None => self.launch().await?,
        };
        Ok(Box::new(driver))
    }

    #[cfg(not(feature = "browser"))]
    async fn create(&self) -> Result<Box<dyn PageDriver>, FetchError> {
        Err(FetchError::Launch(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }

    fn describe(&self) -> String {
        match self.config.remote_url {
            Some(ref url) => format!("remote {}", url),
            None => format!("chromium, headless={}", self.config.headless),
        }
    }
}

/// A running Chromium instance. Each load uses a fresh tab.
#[cfg(feature = "browser")]
pub struct ChromiumDriver {
    browser: Browser,
    handler: tokio::task::JoinHandle<()>,
    options: RenderOptions,
}

#[cfg(feature = "browser")]
struct RenderOptions {
    user_agent: String,
    page_load_timeout: Duration,
    implicit_wait: Duration,
}

#[cfg(feature = "browser")]
impl RenderOptions {
    async fn render(&self, page: &Page, url: &str, settle: Duration) -> Result<String, FetchError> {
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| FetchError::navigation(url, e))?;

        match tokio::time::timeout(self.page_load_timeout, page.execute(nav_params)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(FetchError::navigation(url, e)),
            Err(_) => return Err(FetchError::Timeout(url.to_string())),
        }

        match tokio::time::timeout(
            self.implicit_wait,
            page.evaluate(READY_STATE_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state on {}", url),
        }

        for script in STEALTH_SCRIPTS {
            if let Err(e) = page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }

        tokio::time::sleep(settle).await;

        page.content()
            .await
            .map_err(|e| FetchError::navigation(url, e))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn load(&mut self, url: &str, settle: Duration) -> Result<String, FetchError> {
        debug!("Navigating to {}", url);
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        let result = self.options.render(&page, url, settle).await;

        // Close the tab so they don't accumulate
        let _ = page.close().await;
        result
    }

    async fn quit(&mut self) -> Result<(), FetchError> {
        // A dead browser can't be closed cleanly; dropping the handle is enough
        if let Err(e) = self.browser.close().await {
            debug!("Browser close reported: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}
