//! API routes
//!
//! Route groups and router assembly.

pub mod demo;
pub mod observe;
pub mod ops;
pub mod stats;

use std::path::PathBuf;

use axum::{
    Json, Router,
    handler::HandlerWithoutStateExt,
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::interceptor::observe_traffic;
use crate::state::AppState;

/// Options for building the router
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Serve files from this directory for paths no route claims
    pub static_dir: Option<PathBuf>,
}

/// Build the complete router
pub fn build_router(state: AppState) -> Router {
    build_router_with_options(state, RouterOptions::default())
}

/// Build the complete router with options
pub fn build_router_with_options(state: AppState, options: RouterOptions) -> Router {
    let instrumented = Router::new()
        // Operations routes (health)
        .merge(ops::routes())
        // Query endpoint
        .merge(stats::routes())
        // Demo traffic endpoints
        .merge(demo::routes());

    // Unknown paths: static files first (if configured), JSON 404 otherwise
    let instrumented = match options.static_dir {
        Some(dir) => instrumented
            .fallback_service(ServeDir::new(dir).not_found_service(not_found.into_service())),
        None => instrumented.fallback(not_found),
    };

    // CORS sits inside the interceptor so preflights are observed too.
    // Every instrumented route, fallback included, is observed exactly once.
    let instrumented = instrumented
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            observe_traffic,
        ));

    Router::new()
        // The observer channel is the monitor itself, not monitored traffic
        .merge(observe::routes())
        .merge(instrumented)
        .with_state(state)
}

/// Not-found response body
#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub path: String,
    pub status: &'static str,
}

/// Fallback for paths no route (or static file) claims
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Endpoint not found",
            path: uri.path().to_string(),
            status: "Not Found",
        }),
    )
}
