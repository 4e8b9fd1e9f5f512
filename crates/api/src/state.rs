//! Application state
//!
//! Shared handles passed to every handler and to the interceptor.

use std::sync::Arc;
use std::time::Instant;

use dstats_config::Config;
use dstats_hub::BroadcastHub;
use dstats_stats::{CounterOptions, CounterStore, EstimatePolicy};
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Traffic aggregates
    pub store: Arc<CounterStore>,
    /// Live observer fan-out
    pub hub: Arc<BroadcastHub>,
    /// Prefer forwarded-identity headers over the peer address
    pub trust_forwarded: bool,
    /// Process start, for uptime
    pub started_at: Instant,
    /// Fired on shutdown so long-lived observer connections close
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state around existing store and hub handles
    pub fn new(store: Arc<CounterStore>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store,
            hub,
            trust_forwarded: true,
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create state sized by configuration
    pub fn from_config(config: &Config) -> Self {
        let store = CounterStore::new(
            CounterOptions::from_config(&config.stats),
            EstimatePolicy::from_config(&config.estimates),
        );
        let hub = BroadcastHub::from_config(&config.hub);

        Self::new(Arc::new(store), Arc::new(hub))
            .with_trust_forwarded(config.server.trust_forwarded)
    }

    /// Set whether forwarded-identity headers are trusted
    pub fn with_trust_forwarded(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Use an externally owned shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(CounterStore::default()),
            Arc::new(BroadcastHub::default()),
        )
    }
}
