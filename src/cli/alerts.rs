//! Alert inbox.

use console::style;

use crate::models::AlertKind;
use crate::repository::{StoreError, TrackingStore};

use super::App;

pub async fn cmd_alerts(app: &App) -> anyhow::Result<()> {
    let alerts = app.store.unread_alerts(&app.user).await?;
    if alerts.is_empty() {
        println!("{} No unread alerts", style("✓").green());
        return Ok(());
    }

    println!("\n{} ({})", style("Unread Alerts").bold(), alerts.len());
    println!("{}", "-".repeat(70));
    for notice in alerts {
        let marker = match notice.alert.kind {
            AlertKind::PriceAlert => style("$").green().bold(),
            AlertKind::TimingAlert => style("⏳").yellow(),
        };
        println!(
            "{} {}  {}",
            marker,
            notice.alert.created_at.format("%Y-%m-%d %H:%M"),
            style(&notice.product_name).bold()
        );
        println!("  {}", notice.alert.message);
        println!("  {}", style(format!("id: {}", notice.alert.id)).dim());
    }
    Ok(())
}

pub async fn cmd_read(app: &App, alert_id: &str) -> anyhow::Result<()> {
    match app.store.mark_alert_read(alert_id).await {
        Ok(()) => println!("{} Marked as read", style("✓").green()),
        Err(StoreError::NotFound(_)) => {
            println!("{} Alert '{}' not found", style("✗").red(), alert_id)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
