//! Demo traffic endpoints
//!
//! Targets for load generators so the dashboard has something to show.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use serde::Serialize;

use dstats_hub::iso_timestamp;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Iterations of the `/stress` workload
const STRESS_ITERATIONS: u32 = 1_000_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub message: &'static str,
    #[serde(rename = "currentRPS")]
    pub current_rps: u64,
    pub server_time: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResponse {
    pub message: &'static str,
    pub computation: f64,
    #[serde(rename = "currentRPS")]
    pub current_rps: u64,
    pub status: &'static str,
}

/// Demo routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_handler))
        .route("/stress", get(stress_handler))
}

/// GET /test
async fn test_handler(State(state): State<AppState>) -> Json<TestResponse> {
    Json(TestResponse {
        message: "Test endpoint - Legitimate request",
        current_rps: state.store.current_rps(),
        server_time: iso_timestamp(Utc::now()),
        status: "OK",
    })
}

/// GET /stress
///
/// Burns CPU on the blocking pool so the async workers stay responsive.
async fn stress_handler(State(state): State<AppState>) -> Result<Json<StressResponse>> {
    let computation = tokio::task::spawn_blocking(stress_workload)
        .await
        .map_err(|e| ApiError::internal(format!("stress workload failed: {}", e)))?;

    Ok(Json(StressResponse {
        message: "Stress test completed",
        computation,
        current_rps: state.store.current_rps(),
        status: "Processed",
    }))
}

fn stress_workload() -> f64 {
    (0..STRESS_ITERATIONS).map(|i| f64::from(i).sqrt()).sum()
}
