//! Observer endpoint
//!
//! WebSocket push channel for live dashboards. Each observer is greeted with
//! a `connection` frame and a `stats` frame carrying the RPS history, then
//! receives every broadcast until either side closes.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use dstats_hub::{Frame, PushMessage};
use dstats_stats::CounterStore;

use crate::error::Result;
use crate::state::AppState;

/// Observer routes
///
/// Not wrapped by the traffic interceptor.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(observe_handler))
}

/// GET /ws
///
/// Registration happens before the upgrade so a full hub is answered with
/// 503 instead of an accepted-then-closed socket.
async fn observe_handler(
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> Result<Response> {
    let (id, frames) = state.hub.subscribe_with(|| greeting(&state.store))?;

    info!(id, observers = state.hub.observer_count(), "observer connected");

    Ok(upgrade.on_upgrade(move |socket| run_observer(state, id, frames, socket)))
}

/// Frames a new observer receives before any broadcast: the welcome, then a
/// full snapshot including the RPS history
pub fn greeting(store: &CounterStore) -> Vec<PushMessage> {
    let snapshot = store.snapshot();
    vec![
        PushMessage::connection(snapshot.generated_at),
        PushMessage::stats(&snapshot, true),
    ]
}

/// Pump frames to one observer until it leaves or the server shuts down
async fn run_observer(
    state: AppState,
    id: u64,
    mut frames: mpsc::Receiver<Frame>,
    mut socket: WebSocket,
) {
    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                if socket.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Inbound frames carry no meaning
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    if let Err(e) = state.hub.unsubscribe(id) {
        debug!(id, error = %e, "observer already removed");
    }

    info!(id, observers = state.hub.observer_count(), "observer disconnected");
}
