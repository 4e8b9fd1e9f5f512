//! Per-second cadence
//!
//! The ticker wakes every `tick_interval` (100ms by default) but finalizes at
//! most once per wall-clock second. `Cadence` holds the one piece of state
//! that decides this: the last observed whole second.
//!
//! If the ticker is starved and several seconds pass between ticks, the next
//! tick finalizes once. Everything counted during the gap becomes a single
//! sample and no zero samples are backfilled for the skipped seconds.

use std::sync::Arc;

use tracing::trace;

use crate::snapshot::StatsSnapshot;
use crate::store::CounterStore;

/// Second-boundary detector driving `CounterStore::finalize_second`
#[derive(Debug)]
pub struct Cadence {
    store: Arc<CounterStore>,
    last_observed_second: i64,
}

impl Cadence {
    /// Start observing from the store clock's current second
    pub fn new(store: Arc<CounterStore>) -> Self {
        let last_observed_second = store.clock().now().timestamp();
        Self {
            store,
            last_observed_second,
        }
    }

    /// Run one tick
    ///
    /// Returns the finalized snapshot when the whole second differs from the
    /// last observed one, `None` otherwise.
    pub fn tick(&mut self) -> Option<StatsSnapshot> {
        let now_second = self.store.clock().now().timestamp();
        if now_second == self.last_observed_second {
            return None;
        }

        let skipped = now_second - self.last_observed_second - 1;
        if skipped > 0 {
            trace!(skipped, "ticker skipped whole seconds");
        }

        self.last_observed_second = now_second;
        Some(self.store.finalize_second())
    }

    /// The last whole second a tick observed
    pub fn last_observed_second(&self) -> i64 {
        self.last_observed_second
    }

    /// The store this cadence finalizes
    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }
}

#[cfg(test)]
#[path = "cadence_test.rs"]
mod tests;
