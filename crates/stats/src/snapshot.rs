//! Point-in-time views of the counter store

use chrono::{DateTime, Utc};

use crate::category::CountMap;

/// Immutable copy of the aggregate fields, taken under one lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Last finalized per-second request count
    pub rps: u64,
    /// Recent per-second samples, oldest first
    pub rps_history: Vec<u64>,
    /// Requests seen since start
    pub total_requests: u64,
    /// Illustrative "blocked" estimate (never enforced)
    pub requests_blocked: u64,
    /// Illustrative "bypassed" estimate (never enforced)
    pub requests_bypassed: u64,
    /// Requests by HTTP method
    pub methods: CountMap,
    /// Responses by status code
    pub status_codes: CountMap,
    /// Requests by referer (`"Direct"` when absent)
    pub traffic_sources: CountMap,
    /// Distinct client identities tracked
    pub unique_ips: usize,
    /// When the snapshot was taken
    pub generated_at: DateTime<Utc>,
}

/// Snapshot plus the derived user-agent ranking served by the query endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub snapshot: StatsSnapshot,
    /// `(user agent, count)` pairs, descending, ties in first-seen order
    pub top_user_agents: Vec<(String, u64)>,
}
