//! Background maintenance for [`FetchCache`]: periodic sweep and stats logging.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{info, warn};

use super::store::FetchCache;

/// Owns the maintenance task. Dropping the handle aborts the task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the task and wait for it to finish its current tick.
    pub async fn shutdown(mut self) {
        if let Some(signal) = self.shutdown.take() {
            let _ = signal.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(target = "folio::cache", error = %err, "cache sweeper ended abnormally");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl FetchCache {
    /// Start sweeping expired entries on the configured cadence.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let cache = Arc::clone(self);
        let (shutdown, mut stop) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut sweep = delayed_interval(cache.config().sweep_interval);
            let mut stats = cache.config().stats_log_interval.map(delayed_interval);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = sweep.tick() => {
                        cache.sweep();
                    }
                    _ = next_tick(stats.as_mut()) => log_stats(&cache),
                }
            }
        });

        SweeperHandle {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }
}

/// Interval whose first tick fires one full period from now.
fn delayed_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

fn log_stats(cache: &FetchCache) {
    let stats = cache.stats();
    info!(
        target = "folio::cache",
        total = stats.total,
        fresh = stats.fresh,
        stale = stats.stale,
        fresh_ratio = %format!("{:.1}%", stats.fresh_ratio()),
        hits = stats.hits,
        misses = stats.misses,
        coalesced = stats.coalesced,
        "fetch cache stats"
    );
}
