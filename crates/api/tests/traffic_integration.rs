//! Integration tests for the traffic interceptor and the query endpoint
//!
//! Requests go through the full router with `oneshot`, so there is no TCP
//! peer: client identity falls back to forwarded headers or "unknown".

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use dstats_api::{AppState, RouterOptions, build_router, build_router_with_options};
use dstats_hub::BroadcastHub;
use dstats_stats::CounterStore;

fn test_state() -> AppState {
    AppState::new(
        Arc::new(CounterStore::default()),
        Arc::new(BroadcastHub::new(16, 64)),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_as(uri: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::USER_AGENT, user_agent)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn sum(map: &Value) -> u64 {
    map.as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum()
}

#[tokio::test]
async fn test_stats_endpoint_shape() {
    let app = build_router(test_state());

    let (status, body) = send(&app, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);

    for field in [
        "rps",
        "rpsHistory",
        "totalRequests",
        "requestsBlocked",
        "requestsBypassed",
        "methods",
        "statusCodes",
        "trafficSources",
        "uniqueIPs",
        "topUserAgents",
    ] {
        assert!(body.get(field).is_some(), "missing field {field}");
    }

    // The stats request itself was recorded on arrival
    assert_eq!(body["totalRequests"], 1);
    assert_eq!(body["rps"], 0);
    assert_eq!(body["rpsHistory"], serde_json::json!([]));
}

#[tokio::test]
async fn test_category_sums_match_total() {
    let state = test_state();
    let app = build_router(state.clone());

    for _ in 0..3 {
        send(&app, get("/test")).await;
    }
    let post = Request::builder()
        .method(Method::POST)
        .uri("/test")
        .body(Body::empty())
        .unwrap();
    send(&app, post).await;

    let (_, body) = send(&app, get("/api/stats")).await;

    let total = body["totalRequests"].as_u64().unwrap();
    assert_eq!(total, 5);
    assert_eq!(sum(&body["methods"]), total);
    assert_eq!(sum(&body["trafficSources"]), total);
    assert_eq!(body["methods"]["GET"], 4);
    assert_eq!(body["methods"]["POST"], 1);

    // The stats request's own status is recorded after its body is built
    assert_eq!(sum(&body["statusCodes"]), total - 1);
    assert_eq!(state.store.snapshot().status_codes.total(), total);
}

#[tokio::test]
async fn test_unknown_path_is_counted_as_404() {
    let state = test_state();
    let app = build_router(state.clone());

    let (status, body) = send(&app, get("/no/such/path")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["path"], "/no/such/path");
    assert_eq!(body["status"], "Not Found");

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.status_codes.get("404"), 1);
}

#[tokio::test]
async fn test_cors_preflight_is_counted() {
    let state = test_state();
    let app = build_router(state.clone());

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/stats")
        .header(header::ORIGIN, "https://dashboard.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert!(response.status().is_success());
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.methods.get("OPTIONS"), 1);
    assert_eq!(snapshot.status_codes.total(), 1);
}

#[tokio::test]
async fn test_sentinels_for_missing_headers() {
    let state = test_state();
    let app = build_router(state.clone());

    send(&app, get("/test")).await;

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.traffic_sources.get("Direct"), 1);
    assert_eq!(state.store.user_agents().get("Unknown"), 1);
    assert_eq!(state.store.ips().get("unknown"), 1);
}

#[tokio::test]
async fn test_referer_and_forwarded_identity() {
    let state = test_state();
    let app = build_router(state.clone());

    let request = Request::builder()
        .uri("/test")
        .header(header::REFERER, "https://example.com/page")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    let request = Request::builder()
        .uri("/test")
        .header("x-real-ip", "198.51.100.2")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.traffic_sources.get("https://example.com/page"), 1);
    assert_eq!(snapshot.traffic_sources.get("Direct"), 1);
    assert_eq!(snapshot.unique_ips, 2);
    assert_eq!(state.store.ips().get("203.0.113.7"), 1);
    assert_eq!(state.store.ips().get("198.51.100.2"), 1);
}

#[tokio::test]
async fn test_untrusted_forwarded_headers_are_ignored() {
    let state = test_state().with_trust_forwarded(false);
    let app = build_router(state.clone());

    let request = Request::builder()
        .uri("/test")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    assert_eq!(state.store.ips().get("203.0.113.7"), 0);
    assert_eq!(state.store.ips().get("unknown"), 1);
}

#[tokio::test]
async fn test_top_user_agents_ordering() {
    let app = build_router(test_state());

    for _ in 0..3 {
        send(&app, get_as("/test", "curl/8.0")).await;
    }
    for _ in 0..2 {
        send(&app, get_as("/test", "Mozilla/5.0")).await;
    }
    send(&app, get_as("/test", "wrk")).await;

    let (_, body) = send(&app, get_as("/api/stats", "curl/8.0")).await;

    let top = body["topUserAgents"].as_array().unwrap();
    assert_eq!(top[0], serde_json::json!(["curl/8.0", 4]));
    assert_eq!(top[1], serde_json::json!(["Mozilla/5.0", 2]));
    assert_eq!(top[2], serde_json::json!(["wrk", 1]));
}

#[tokio::test]
async fn test_demo_endpoints() {
    let app = build_router(test_state());

    let (status, body) = send(&app, get("/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Test endpoint - Legitimate request");
    assert_eq!(body["status"], "OK");
    assert!(body["currentRPS"].is_u64());
    assert!(body["serverTime"].as_str().unwrap().ends_with('Z'));

    let (status, body) = send(&app, get("/stress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Stress test completed");
    assert_eq!(body["status"], "Processed");
    assert!(body["computation"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_health() {
    let app = build_router(test_state());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["observers"], 0);
    assert_eq!(body["framesDropped"], 0);
}

#[tokio::test]
async fn test_static_dir_serves_files_and_falls_back_to_404() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>dashboard</h1>").unwrap();

    let state = test_state();
    let app = build_router_with_options(
        state.clone(),
        RouterOptions {
            static_dir: Some(dir.path().to_path_buf()),
        },
    );

    let response = app.clone().oneshot(get("/index.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>dashboard</h1>");

    let (status, body) = send(&app, get("/missing.js")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/missing.js");

    // Static traffic is observed like any other route
    let snapshot = state.store.snapshot();
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.status_codes.get("200"), 1);
    assert_eq!(snapshot.status_codes.get("404"), 1);
}
