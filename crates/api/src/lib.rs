//! DStats API
//!
//! HTTP surface for the live traffic monitor.
//!
//! # Overview
//!
//! Every HTTP route is wrapped by the traffic interceptor, which records the
//! request in the `CounterStore`, pushes a `request` event to observers,
//! and once the handler's response is fixed records its status and pushes a
//! `response` event. A ticker task finalizes one RPS sample per second and
//! pushes a `stats` snapshot.
//!
//! # Usage
//!
//! ```ignore
//! use dstats_api::{build_router, spawn_ticker, AppState};
//!
//! let state = AppState::from_config(&config);
//! let ticker = spawn_ticker(&state, config.stats.tick_interval, cancel.clone());
//!
//! let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! # Endpoints
//!
//! ## Monitoring
//! - `GET /api/stats` - Current aggregates and top user agents
//! - `GET /ws` - WebSocket push channel (connection, request, response, stats)
//! - `GET /health` - Liveness, uptime and observer delivery health
//!
//! ## Demo traffic
//! - `GET /test` - Cheap endpoint for generating legitimate traffic
//! - `GET /stress` - CPU-heavy endpoint
//!
//! Unknown paths are served from the static directory when configured, and
//! otherwise answered with a JSON 404.

pub mod error;
pub mod interceptor;
pub mod routes;
pub mod state;
pub mod ticker;

// Re-exports
pub use error::{ApiError, Result};
pub use interceptor::{client_identity, observe_traffic};
pub use routes::{RouterOptions, build_router, build_router_with_options};
pub use state::AppState;
pub use ticker::spawn_ticker;
