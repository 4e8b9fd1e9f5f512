//! Query endpoint
//!
//! Pull-based read of the current aggregates.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use dstats_stats::{CountMap, StatsReport};

use crate::state::AppState;

/// `GET /api/stats` response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub rps: u64,
    pub rps_history: Vec<u64>,
    pub total_requests: u64,
    pub requests_blocked: u64,
    pub requests_bypassed: u64,
    pub methods: CountMap,
    pub status_codes: CountMap,
    pub traffic_sources: CountMap,
    #[serde(rename = "uniqueIPs")]
    pub unique_ips: usize,
    /// `[userAgent, count]` pairs, most frequent first
    pub top_user_agents: Vec<(String, u64)>,
}

impl From<StatsReport> for StatsResponse {
    fn from(report: StatsReport) -> Self {
        let snapshot = report.snapshot;
        Self {
            rps: snapshot.rps,
            rps_history: snapshot.rps_history,
            total_requests: snapshot.total_requests,
            requests_blocked: snapshot.requests_blocked,
            requests_bypassed: snapshot.requests_bypassed,
            methods: snapshot.methods,
            status_codes: snapshot.status_codes,
            traffic_sources: snapshot.traffic_sources,
            unique_ips: snapshot.unique_ips,
            top_user_agents: report.top_user_agents,
        }
    }
}

/// Query routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(stats_handler))
}

/// Current aggregates
///
/// GET /api/stats
///
/// Takes no input and never fails.
async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.store.report().into())
}
