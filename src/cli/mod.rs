//! Command line interface.
//!
//! Parses arguments, loads config, and dispatches to the command modules.

mod alerts;
mod app;
mod helpers;
mod info;
mod poll;
mod products;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

pub use app::App;

#[derive(Parser)]
#[command(name = "dealwatch")]
#[command(about = "Track retail prices and get alerted when they drop")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// User whose products and alerts are shown
    #[arg(short, long, global = true, env = "DEALWATCH_USER", default_value = "default")]
    user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a product
    Track {
        /// Product name, used as the search query
        name: String,
        /// Alert when the cheapest price is at or below this
        target_price: f64,
    },

    /// List tracked products
    Products,

    /// Turn price checks on or off for a product
    AlertsToggle {
        product_id: String,
        #[arg(long, conflicts_with = "off", required_unless_present = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },

    /// Show recorded prices for a product
    History { product_id: String },

    /// Search retailers for a product now
    Search {
        name: String,
        /// Maximum deals to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check every tracked product once
    Check,

    /// Check tracked products on a schedule until interrupted
    Watch {
        /// Seconds between checks (default from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show unread alerts
    Alerts,

    /// Mark an alert as read
    Read { alert_id: String },

    /// Show platform, user agent and browser mode
    Info,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => Config::load().await,
    };

    if let Commands::Info = cli.command {
        return info::cmd_info(&config, cli.database.as_deref());
    }

    let app = App::open(config, cli.database.as_deref(), &cli.user).await?;

    match cli.command {
        Commands::Track { name, target_price } => {
            products::cmd_track(&app, &name, target_price).await
        }
        Commands::Products => products::cmd_products(&app).await,
        Commands::AlertsToggle { product_id, on, .. } => {
            products::cmd_toggle(&app, &product_id, on).await
        }
        Commands::History { product_id } => products::cmd_history(&app, &product_id).await,
        Commands::Search { name, limit } => search::cmd_search(&app, &name, limit).await,
        Commands::Check => poll::cmd_check(&app).await,
        Commands::Watch { interval } => poll::cmd_watch(&app, interval).await,
        Commands::Alerts => alerts::cmd_alerts(&app).await,
        Commands::Read { alert_id } => alerts::cmd_read(&app, &alert_id).await,
        Commands::Info => Ok(()),
    }
}
