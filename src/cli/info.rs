//! Environment summary.

use std::path::Path;

use console::style;

use crate::browser::{ChromiumFactory, DriverFactory};
use crate::config::Config;

pub fn cmd_info(config: &Config, database: Option<&Path>) -> anyhow::Result<()> {
    let factory = ChromiumFactory::new(config.browser.clone());

    println!("\n{}", style("dealwatch").bold());
    println!("{}", "-".repeat(60));
    println!("{:<14} {} / {}", "Platform:", std::env::consts::OS, std::env::consts::ARCH);
    println!("{:<14} {}", "User agent:", factory.user_agent());
    println!("{:<14} {}", "Browser:", factory.describe());
    println!(
        "{:<14} {}",
        "HTTP fallback:",
        if config.browser.http_fallback {
            format!("on ({}s timeout)", config.browser.http_timeout().as_secs())
        } else {
            "off".to_string()
        }
    );
    println!(
        "{:<14} {}",
        "Compiled:",
        if cfg!(feature = "browser") {
            style("with browser support").green()
        } else {
            style("without browser support").yellow()
        }
    );
    println!("{:<14} {}", "Database:", config.database_path(database).display());
    println!(
        "{:<14} {} ({}, {})",
        "LLM:",
        if config.llm.enabled { "enabled" } else { "disabled" },
        config.llm.model,
        config.llm.endpoint
    );
    println!(
        "{:<14} every {}s, timing alerts {}",
        "Poller:",
        config.poller.interval_secs,
        if config.poller.timing_alerts { "on" } else { "off" }
    );
    if let Some(ref path) = config.source_path {
        println!("{:<14} {}", "Config:", path.display());
    }
    Ok(())
}
