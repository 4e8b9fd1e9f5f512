//! The counter store
//!
//! One `CounterStore` per process holds every aggregate the dashboard shows.
//! All mutations take the write lock over the whole field set, so a snapshot
//! can never observe `total_requests` without the matching category
//! increments, or a finalized RPS sample without its estimates.

use std::collections::VecDeque;
use std::sync::Arc;

use dstats_config::StatsConfig;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::category::{CategoryCounts, CountMap, Recorded};
use crate::clock::{Clock, SystemClock};
use crate::estimate::EstimatePolicy;
use crate::snapshot::{StatsReport, StatsSnapshot};

/// User agent recorded when the header is absent
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Referer recorded when the header is absent
pub const DIRECT_REFERER: &str = "Direct";

/// Sizing for the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOptions {
    /// RPS samples kept, oldest evicted first
    pub history_len: usize,
    /// Distinct keys per category before folding into the overflow key
    pub max_keys_per_category: usize,
    /// Length of the user-agent ranking in reports
    pub top_user_agents: usize,
}

impl CounterOptions {
    /// Build from the `[stats]` config section
    pub fn from_config(config: &StatsConfig) -> Self {
        Self {
            history_len: config.history_len,
            max_keys_per_category: config.max_keys_per_category,
            top_user_agents: config.top_user_agents,
        }
    }
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self::from_config(&StatsConfig::default())
    }
}

/// The categorical fields of an inbound request
#[derive(Debug, Clone, Copy)]
pub struct RequestRecord<'a> {
    pub method: &'a str,
    /// Best-effort client identity
    pub ip: &'a str,
    /// `None` records under [`UNKNOWN_USER_AGENT`]
    pub user_agent: Option<&'a str>,
    /// `None` records under [`DIRECT_REFERER`]
    pub referer: Option<&'a str>,
}

#[derive(Debug)]
struct Counters {
    requests_this_second: u64,
    current_rps: u64,
    rps_history: VecDeque<u64>,
    total_requests: u64,
    requests_blocked: u64,
    requests_bypassed: u64,
    methods: CategoryCounts,
    status_codes: CategoryCounts,
    ips: CategoryCounts,
    user_agents: CategoryCounts,
    referers: CategoryCounts,
}

impl Counters {
    fn new(options: &CounterOptions) -> Self {
        let max_keys = options.max_keys_per_category;
        Self {
            requests_this_second: 0,
            current_rps: 0,
            rps_history: VecDeque::with_capacity(options.history_len + 1),
            total_requests: 0,
            requests_blocked: 0,
            requests_bypassed: 0,
            methods: CategoryCounts::new(max_keys),
            status_codes: CategoryCounts::new(max_keys),
            ips: CategoryCounts::new(max_keys),
            user_agents: CategoryCounts::new(max_keys),
            referers: CategoryCounts::new(max_keys),
        }
    }

    fn snapshot(&self, clock: &dyn Clock) -> StatsSnapshot {
        StatsSnapshot {
            rps: self.current_rps,
            rps_history: self.rps_history.iter().copied().collect(),
            total_requests: self.total_requests,
            requests_blocked: self.requests_blocked,
            requests_bypassed: self.requests_bypassed,
            methods: self.methods.to_count_map(),
            status_codes: self.status_codes.to_count_map(),
            traffic_sources: self.referers.to_count_map(),
            unique_ips: self.ips.tracked_keys(),
            generated_at: clock.now(),
        }
    }
}

/// Process-wide traffic aggregates, shared by the interceptor, ticker and
/// query endpoint
#[derive(Debug)]
pub struct CounterStore {
    inner: RwLock<Counters>,
    options: CounterOptions,
    policy: EstimatePolicy,
    clock: Arc<dyn Clock>,
}

impl CounterStore {
    /// Create a store on the system clock
    pub fn new(options: CounterOptions, policy: EstimatePolicy) -> Self {
        Self::with_clock(options, policy, Arc::new(SystemClock::new()))
    }

    /// Create a store reading time from `clock`
    pub fn with_clock(
        options: CounterOptions,
        policy: EstimatePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: RwLock::new(Counters::new(&options)),
            options,
            policy,
            clock,
        }
    }

    /// The clock snapshots and the ticker read from
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Store sizing
    pub fn options(&self) -> &CounterOptions {
        &self.options
    }

    /// Fold an inbound request into the aggregates
    pub fn record_request(&self, record: &RequestRecord<'_>) {
        let user_agent = record.user_agent.unwrap_or(UNKNOWN_USER_AGENT);
        let referer = record.referer.unwrap_or(DIRECT_REFERER);

        let outcomes = {
            let mut counters = self.inner.write();
            counters.requests_this_second += 1;
            counters.total_requests += 1;
            [
                ("method", counters.methods.increment(record.method)),
                ("ip", counters.ips.increment(record.ip)),
                ("user_agent", counters.user_agents.increment(user_agent)),
                ("referer", counters.referers.increment(referer)),
            ]
        };

        for (category, outcome) in outcomes {
            self.report_saturation(category, outcome);
        }
    }

    /// Fold a completed response's status code into the aggregates
    pub fn record_response(&self, status: u16) {
        let outcome = self
            .inner
            .write()
            .status_codes
            .increment(&status.to_string());
        self.report_saturation("status_code", outcome);
    }

    fn report_saturation(&self, category: &'static str, outcome: Recorded) {
        if matches!(outcome, Recorded::Folded { first: true }) {
            warn!(
                category,
                max_keys = self.options.max_keys_per_category,
                "category key limit reached, new keys are folded into overflow"
            );
        }
    }

    /// Close out the current second
    ///
    /// Moves the in-progress count into the RPS sample, appends it to the
    /// history window, accrues the illustrative estimates and returns a
    /// snapshot taken under the same lock.
    pub fn finalize_second(&self) -> StatsSnapshot {
        let mut counters = self.inner.write();

        let rps = std::mem::take(&mut counters.requests_this_second);
        counters.current_rps = rps;

        counters.rps_history.push_back(rps);
        while counters.rps_history.len() > self.options.history_len {
            counters.rps_history.pop_front();
        }

        let estimate = self.policy.estimate(rps);
        counters.requests_blocked += estimate.blocked;
        counters.requests_bypassed += estimate.bypassed;

        if rps > 0 {
            debug!(
                rps,
                blocked = estimate.blocked,
                bypassed = estimate.bypassed,
                "second finalized"
            );
        }

        counters.snapshot(self.clock.as_ref())
    }

    /// Consistent copy of the aggregates
    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.read().snapshot(self.clock.as_ref())
    }

    /// Snapshot plus the top user-agent ranking, taken under one lock
    pub fn report(&self) -> StatsReport {
        let counters = self.inner.read();
        StatsReport {
            snapshot: counters.snapshot(self.clock.as_ref()),
            top_user_agents: counters.user_agents.top_n(self.options.top_user_agents),
        }
    }

    /// Requests by user agent
    pub fn user_agents(&self) -> CountMap {
        self.inner.read().user_agents.to_count_map()
    }

    /// Requests by client identity
    pub fn ips(&self) -> CountMap {
        self.inner.read().ips.to_count_map()
    }

    /// Last finalized per-second request count
    pub fn current_rps(&self) -> u64 {
        self.inner.read().current_rps
    }

    /// Requests counted toward the second in progress
    pub fn requests_this_second(&self) -> u64 {
        self.inner.read().requests_this_second
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new(CounterOptions::default(), EstimatePolicy::default())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
