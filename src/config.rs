//! Configuration for dealwatch using the prefer crate for discovery.
//!
//! Every section has serde defaults, so a partial file (or none) is valid.
//! Environment variables are applied on top of whatever was loaded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::BrowserConfig;
use crate::llm::LlmConfig;

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "dealwatch.db";

/// Live search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Pause after each retailer, in seconds.
    #[serde(default = "default_retailer_delay_secs")]
    pub retailer_delay_secs: u64,
    /// Deals requested per search.
    #[serde(default = "default_deals_per_search")]
    pub deals_per_search: usize,
    /// Fall back to generated deals when every retailer comes back empty.
    #[serde(default = "default_true")]
    pub synthetic_fallback: bool,
}

fn default_retailer_delay_secs() -> u64 {
    2
}

fn default_deals_per_search() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            retailer_delay_secs: default_retailer_delay_secs(),
            deals_per_search: default_deals_per_search(),
            synthetic_fallback: true,
        }
        .with_env_overrides()
    }
}

impl ScraperConfig {
    /// Apply `DEALWATCH_RETAILER_DELAY` and `DEALWATCH_DEALS_PER_SEARCH`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = env_parse("DEALWATCH_RETAILER_DELAY") {
            self.retailer_delay_secs = secs;
        }
        if let Some(count) = env_parse("DEALWATCH_DEALS_PER_SEARCH") {
            self.deals_per_search = count;
        }
        self
    }

    pub fn retailer_delay(&self) -> Duration {
        Duration::from_secs(self.retailer_delay_secs)
    }
}

/// Background price check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between scheduled runs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Pause between products within a run, in seconds.
    #[serde(default = "default_product_delay_secs")]
    pub product_delay_secs: u64,
    /// Ask the timing analyzer whether to wait.
    #[serde(default = "default_true")]
    pub timing_alerts: bool,
}

fn default_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_product_delay_secs() -> u64 {
    2
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            product_delay_secs: default_product_delay_secs(),
            timing_alerts: true,
        }
        .with_env_overrides()
    }
}

impl PollerConfig {
    /// Apply `DEALWATCH_INTERVAL` and `DEALWATCH_TIMING_ALERTS`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = env_parse("DEALWATCH_INTERVAL") {
            self.interval_secs = secs;
        }
        if let Ok(val) = std::env::var("DEALWATCH_TIMING_ALERTS") {
            self.timing_alerts = val.eq_ignore_ascii_case("true") || val == "1";
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn product_delay(&self) -> Duration {
        Duration::from_secs(self.product_delay_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// Database file path (`~` is expanded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Where this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    pub async fn load() -> Self {
        match prefer::load("dealwatch").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("{}; using defaults", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(e) => {
                debug!("No config file found: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.browser = config.browser.with_env_overrides();
        config.scraper = config.scraper.with_env_overrides();
        config.poller = config.poller.with_env_overrides();
        config.llm = config.llm.with_env_overrides();
        Ok(config)
    }

    /// Resolve the database path.
    ///
    /// Precedence: `explicit` (the `--database` flag), `DATABASE_URL`,
    /// the config file, then `<data dir>/dealwatch.db`.
    pub fn database_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return expand(&path.to_string_lossy());
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            let url = url.strip_prefix("sqlite:").unwrap_or(&url);
            return expand(url);
        }
        if let Some(ref database) = self.database {
            return expand(database);
        }
        default_data_dir().join(DEFAULT_DATABASE_FILENAME)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// `<platform data dir>/dealwatch`, falling back to the current directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dealwatch")
}
