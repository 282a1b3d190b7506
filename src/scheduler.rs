//! Runs the price poller on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::poller::{PollReport, PricePoller};

pub struct Scheduler {
    interval: Duration,
}

/// Handle to a running schedule.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling. The first run happens immediately.
    pub fn start(&self, poller: Arc<PricePoller>) -> SchedulerHandle {
        self.start_with(move || {
            let poller = poller.clone();
            async move { poller.run_once().await }
        })
    }

    fn start_with<F, Fut>(&self, mut run: F) -> SchedulerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = PollReport> + Send + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs = 0usize;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // A run in progress is finished before the stop flag is seen
                        let report = run().await;
                        runs += 1;
                        info!("Scheduled run {} complete: {}", runs, report);
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            runs
        });

        info!("Scheduler started, interval {:?}", period);
        SchedulerHandle { stop, task }
    }
}

impl SchedulerHandle {
    /// Signal the task and wait for it to exit. Returns the number of runs.
    pub async fn stop(self) -> usize {
        let _ = self.stop.send(true);
        match self.task.await {
            Ok(runs) => runs,
            Err(e) => {
                warn!("Scheduler task ended abnormally: {}", e);
                0
            }
        }
    }
}
