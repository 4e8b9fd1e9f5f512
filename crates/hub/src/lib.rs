//! DStats Hub - live push channel for dashboard observers
//!
//! This crate fans traffic events and per-second stats snapshots out to every
//! connected observer. It:
//!
//! - Serializes each message once and shares the frame across observers
//! - Never blocks the sender: full observer buffers drop the frame
//! - Skips closed observers and cleans them up periodically
//! - Greets new observers with a welcome and a full snapshot before any
//!   broadcast reaches them
//! - Has near-zero cost when no observers are connected
//!
//! # Architecture
//!
//! ```text
//! interceptor ──request/response──┐
//!                                 ▼
//! ticker ─────────stats────→ BroadcastHub ──try_send──→ Observer channels
//!                                                            │
//!                                                            ▼
//!                                                   WebSocket tasks (api)
//! ```

mod error;
pub mod hub;
pub mod observer;
pub mod protocol;

pub use error::{HubError, Result};
pub use hub::{BroadcastHub, HubStats};
pub use observer::{Delivery, Frame, Observer};
pub use protocol::{PushMessage, StatsMessage, iso_timestamp};
