//! Price checks, once or on a schedule.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use crate::scheduler::Scheduler;

use super::App;

pub async fn cmd_check(app: &App) -> anyhow::Result<()> {
    let stack = app.search_stack()?;
    let poller = app.poller(&stack);

    println!("{} Checking tracked products...", style("→").cyan());
    let report = poller.run_once().await;
    stack.shutdown().await;

    println!("{} {}", style("✓").green(), report);
    if report.price_alerts + report.timing_alerts > 0 {
        println!("  Run 'dealwatch alerts' to read them.");
    }
    Ok(())
}

pub async fn cmd_watch(app: &App, interval: Option<u64>) -> anyhow::Result<()> {
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| app.config.poller.interval());
    let stack = app.search_stack()?;
    let poller = Arc::new(app.poller(&stack));

    let scheduler = Scheduler::new(interval);
    println!(
        "{} Checking prices every {}s. Press Ctrl-C to stop.",
        style("→").cyan(),
        scheduler.interval().as_secs()
    );
    let handle = scheduler.start(poller);

    tokio::signal::ctrl_c().await?;
    println!("\n{} Stopping after the current check...", style("!").yellow());
    let runs = handle.stop().await;
    stack.shutdown().await;

    println!("{} Completed {} scheduled runs", style("✓").green(), runs);
    Ok(())
}
