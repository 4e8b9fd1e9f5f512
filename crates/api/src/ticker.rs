//! The cadence ticker task
//!
//! Wakes every `period` on a fixed wall-clock cadence, independent of
//! traffic, and pushes a `stats` snapshot each time a second boundary is
//! crossed. Missed wakeups are skipped rather than replayed in a burst.

use std::sync::Arc;
use std::time::Duration;

use dstats_hub::PushMessage;
use dstats_stats::Cadence;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::state::AppState;

/// Spawn the ticker for `state`'s store and hub
pub fn spawn_ticker(state: &AppState, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    let mut cadence = Cadence::new(Arc::clone(&state.store));
    let hub = Arc::clone(&state.hub);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(period_ms = period.as_millis() as u64, "ticker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Some(snapshot) = cadence.tick() {
                        hub.broadcast(&PushMessage::stats(&snapshot, false));
                    }
                }
            }
        }

        debug!("ticker stopped");
    })
}
