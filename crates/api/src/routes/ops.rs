//! Operations routes
//!
//! Health check exposing uptime and the observer fan-out's delivery health.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Server status
    pub status: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Connected observers
    pub observers: usize,
    /// Frames dropped on full observer buffers since start
    pub frames_dropped: u64,
}

/// Operations routes (health)
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// Health check endpoint
///
/// GET /health
///
/// Always returns 200 OK if the server is running.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let hub = state.hub.stats();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        observers: hub.observers,
        frames_dropped: hub.frames_dropped,
    })
}
