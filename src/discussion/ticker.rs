//! Cancellable periodic task: "run every N until stopped".
//!
//! The first tick fires immediately. Each tick spawns its job as a detached
//! task, so a slow request never delays the next tick and stopping the timer
//! does not cancel requests already in flight. Callers discard those late
//! results by scope (see `store`). Missed ticks are skipped, not bunched.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct PeriodicTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn the timer loop. `job` receives the zero-based tick number.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // `interval` panics on a zero period.
        let period = period.max(MIN_PERIOD);
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        debug!(task = name, period_ms, "periodic task started");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;
            loop {
                ticker.tick().await;
                tokio::spawn(job(tick));
                tick += 1;
            }
        });

        Self { name, handle: Some(handle) }
    }

    /// Cancel the timer and wait until the loop has fully exited.
    pub async fn stop(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        handle.abort();
        match handle.await {
            Err(e) if e.is_panic() => warn!(task = self.name, error = %e, "periodic task panicked"),
            _ => debug!(task = self.name, "periodic task stopped"),
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "ticker_test.rs"]
mod tests;
