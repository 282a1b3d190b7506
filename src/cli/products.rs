//! Product tracking commands.

use console::style;

use crate::repository::{StoreError, TrackingStore};

use super::helpers::{format_price, truncate};
use super::App;

pub async fn cmd_track(app: &App, name: &str, target_price: f64) -> anyhow::Result<()> {
    let id = app.store.create_product(&app.user, name, target_price).await?;
    println!(
        "{} Tracking {} (target {})",
        style("✓").green(),
        style(name).bold(),
        format_price(target_price)
    );
    println!("  id: {}", id);
    Ok(())
}

pub async fn cmd_products(app: &App) -> anyhow::Result<()> {
    let products = app.store.list_products(&app.user).await?;
    if products.is_empty() {
        println!(
            "{} No tracked products. Add one with 'dealwatch track <name> <price>'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Tracked Products").bold());
    println!("{}", "-".repeat(80));
    println!("{:<36}  {:<24} {:>10}  Alerts", "ID", "Name", "Target");
    println!("{}", "-".repeat(80));
    for product in products {
        let alerts = if product.alert_enabled {
            style("on").green()
        } else {
            style("off").dim()
        };
        println!(
            "{:<36}  {:<24} {:>10}  {}",
            product.id,
            truncate(&product.name, 24),
            format_price(product.target_price),
            alerts
        );
    }
    Ok(())
}

pub async fn cmd_toggle(app: &App, product_id: &str, enabled: bool) -> anyhow::Result<()> {
    match app.store.set_alert_enabled(product_id, enabled).await {
        Ok(()) => {
            println!(
                "{} Alerts {} for {}",
                style("✓").green(),
                if enabled { "enabled" } else { "disabled" },
                product_id
            );
            Ok(())
        }
        Err(StoreError::NotFound(_)) => {
            println!("{} Product '{}' not found", style("✗").red(), product_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_history(app: &App, product_id: &str) -> anyhow::Result<()> {
    let history = match app.store.price_history(product_id).await {
        Ok(history) => history,
        Err(StoreError::NotFound(_)) => {
            println!("{} Product '{}' not found", style("✗").red(), product_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if history.is_empty() {
        println!("{} No prices recorded yet. Run 'dealwatch check'.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Price History").bold());
    println!("{}", "-".repeat(70));
    for observation in history {
        println!(
            "{}  {:<12} {:>10}  {}",
            observation.checked_at.format("%Y-%m-%d %H:%M"),
            truncate(&observation.retailer, 12),
            format_price(observation.price),
            style(&observation.url).dim()
        );
    }
    Ok(())
}
