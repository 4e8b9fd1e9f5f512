//! Traffic interceptor middleware
//!
//! Wraps every instrumented route (including the not-found fallback) and
//! observes each request exactly once:
//!
//! 1. On arrival: record method, client identity, user agent and referer in
//!    the counter store, then push a `request` event.
//! 2. When the handler's response is produced (status fixed): record the
//!    status code, then push a `response` event with the elapsed time.
//!
//! The interceptor is an observer, never a gate. The response passes through
//! untouched and nothing here rejects or delays a request.
//!
//! # Client identity
//!
//! Best effort, in order:
//! - first entry of `X-Forwarded-For` (when forwarded headers are trusted)
//! - `X-Real-IP` (when forwarded headers are trusted)
//! - the TCP peer address from `ConnectInfo`
//! - `"unknown"`

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use dstats_hub::PushMessage;
use dstats_stats::{RequestRecord, UNKNOWN_USER_AGENT};
use tracing::trace;

use crate::state::AppState;

/// Identity recorded when nothing identifies the client
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Middleware that records and broadcasts every request/response pair
pub async fn observe_traffic(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();

    let method = request.method().as_str().to_string();
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let ip = client_identity(&request, state.trust_forwarded);
    let user_agent = header_value(request.headers(), header::USER_AGENT);
    let referer = header_value(request.headers(), header::REFERER);

    state.store.record_request(&RequestRecord {
        method: &method,
        ip: &ip,
        user_agent: user_agent.as_deref(),
        referer: referer.as_deref(),
    });

    if state.hub.has_observers() {
        state.hub.broadcast(&PushMessage::request(
            &method,
            &url,
            &ip,
            user_agent.as_deref().unwrap_or(UNKNOWN_USER_AGENT),
            state.store.clock().now(),
        ));
    }

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;

    state.store.record_response(status);

    if state.hub.has_observers() {
        state.hub.broadcast(&PushMessage::response(
            &method,
            &url,
            status,
            duration_ms,
            state.store.clock().now(),
        ));
    }

    trace!(method = %method, url = %url, ip = %ip, status, duration_ms, "request observed");

    response
}

/// Best-effort client identity for a request
pub fn client_identity<B>(request: &axum::http::Request<B>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        // Try X-Forwarded-For header first (for proxies)
        if let Some(value) = header_value(request.headers(), "x-forwarded-for")
            && let Some(first) = value.split(',').next()
            && !first.trim().is_empty()
        {
            return first.trim().to_string();
        }

        if let Some(value) = header_value(request.headers(), "x-real-ip")
            && !value.trim().is_empty()
        {
            return value.trim().to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_canonical().to_string();
    }

    UNKNOWN_CLIENT.to_string()
}

/// Header as UTF-8 text; absent or non-UTF-8 values read as `None`
fn header_value<K>(headers: &HeaderMap, name: K) -> Option<String>
where
    K: header::AsHeaderName,
{
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
