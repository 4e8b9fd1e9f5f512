//! Integration tests for live observer delivery
//!
//! Observers are registered on the hub directly, greeted the same way the
//! `/ws` endpoint greets them. The socket transport itself needs a real
//! upgraded connection.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use dstats_api::routes::observe::greeting;
use dstats_api::{AppState, build_router};
use dstats_hub::{BroadcastHub, Frame, PushMessage};
use dstats_stats::{CounterStore, RequestRecord};

fn test_state() -> AppState {
    AppState::new(
        Arc::new(CounterStore::default()),
        Arc::new(BroadcastHub::new(16, 64)),
    )
}

fn drain(frames: &mut mpsc::Receiver<Frame>) -> Vec<Value> {
    let mut out = Vec::new();
    while let Ok(frame) = frames.try_recv() {
        out.push(serde_json::from_str(&frame).unwrap());
    }
    out
}

#[tokio::test]
async fn test_observer_sees_request_then_response() {
    let state = test_state();
    let app = build_router(state.clone());
    let (_id, mut frames) = state.hub.subscribe().unwrap();

    let request = Request::builder()
        .uri("/test?x=1")
        .header(header::USER_AGENT, "probe/1.0")
        .header("x-forwarded-for", "192.0.2.10")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = drain(&mut frames);
    assert_eq!(events.len(), 2);

    let request = &events[0];
    assert_eq!(request["type"], "request");
    assert_eq!(request["method"], "GET");
    assert_eq!(request["url"], "/test?x=1");
    assert_eq!(request["ip"], "192.0.2.10");
    assert_eq!(request["userAgent"], "probe/1.0");
    assert!(request["timestamp"].as_str().unwrap().ends_with('Z'));

    let response = &events[1];
    assert_eq!(response["type"], "response");
    assert_eq!(response["method"], "GET");
    assert_eq!(response["url"], "/test?x=1");
    assert_eq!(response["statusCode"], 200);
    assert!(response["duration"].is_u64());
}

#[tokio::test]
async fn test_new_observer_is_greeted_before_events() {
    let state = test_state();
    for _ in 0..3 {
        state.store.record_request(&RequestRecord {
            method: "GET",
            ip: "10.0.0.1",
            user_agent: None,
            referer: None,
        });
    }
    state.store.finalize_second();

    let (_id, mut frames) = state.hub.subscribe_with(|| greeting(&state.store)).unwrap();
    state.hub.broadcast(&PushMessage::request(
        "GET",
        "/test",
        "10.0.0.2",
        "curl/8.0",
        state.store.clock().now(),
    ));

    let events = drain(&mut frames);
    assert_eq!(events.len(), 3);

    assert_eq!(events[0]["type"], "connection");
    assert_eq!(events[0]["message"], "Connected to DStats monitoring");

    assert_eq!(events[1]["type"], "stats");
    assert_eq!(events[1]["rps"], 3);
    assert_eq!(events[1]["rpsHistory"], serde_json::json!([3]));
    assert_eq!(events[1]["totalRequests"], 3);
    assert_eq!(events[1]["ips"], 1);

    assert_eq!(events[2]["type"], "request");
}

#[test]
fn test_greeting_is_connection_then_stats_with_history() {
    let store = CounterStore::default();
    let frames = greeting(&store);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].kind(), "connection");
    match &frames[1] {
        PushMessage::Stats(stats) => assert_eq!(stats.rps_history, Some(Vec::new())),
        other => panic!("expected stats, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_response_event_carries_404() {
    let state = test_state();
    let app = build_router(state.clone());
    let (_id, mut frames) = state.hub.subscribe().unwrap();

    let request = Request::builder()
        .uri("/nowhere")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    let events = drain(&mut frames);
    assert_eq!(events[0]["userAgent"], "Unknown");
    assert_eq!(events[1]["statusCode"], 404);
}

#[tokio::test]
async fn test_response_passes_through_unchanged() {
    let state = test_state();
    let app = build_router(state.clone());
    let (_id, _frames) = state.hub.subscribe().unwrap();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["observers"], 1);
}

#[tokio::test]
async fn test_observer_endpoint_is_not_instrumented() {
    let state = test_state();
    let app = build_router(state.clone());

    // Not a real upgrade, so the extractor rejects it
    let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());

    assert_eq!(state.store.snapshot().total_requests, 0);
    assert_eq!(state.hub.observer_count(), 0);
}

#[tokio::test]
async fn test_no_observers_means_no_frames_encoded() {
    let state = test_state();
    let app = build_router(state.clone());

    let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap();

    assert_eq!(state.hub.stats().broadcasts, 0);
    assert_eq!(state.store.snapshot().total_requests, 1);
}
