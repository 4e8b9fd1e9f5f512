//! A single connected observer
//!
//! Each observer owns the sending half of a bounded channel; its connection
//! task drains the receiving half. Sends never wait: a full buffer drops the
//! frame and a dropped receiver marks the observer closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::warn;

/// Counter for generating unique observer IDs
static OBSERVER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One encoded push message, shared by every observer it is sent to
pub type Frame = Arc<str>;

/// Outcome of a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Frame queued
    Sent,
    /// Observer buffer full, frame dropped
    Dropped,
    /// Observer disconnected
    Closed,
}

/// A live push subscription
#[derive(Debug)]
pub struct Observer {
    /// Unique identifier
    id: u64,
    /// Channel sender for frame delivery
    sender: mpsc::Sender<Frame>,
    /// Frames dropped because the buffer was full
    dropped: AtomicU64,
}

impl Observer {
    /// Create a new observer around a channel sender
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: OBSERVER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            sender,
            dropped: AtomicU64::new(0),
        }
    }

    /// Get the observer ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Try to queue a frame without waiting
    pub fn try_send(&self, frame: Frame) -> Delivery {
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let previous = self.dropped.fetch_add(1, Ordering::Relaxed);
                if previous == 0 {
                    warn!(observer = self.id, "observer buffer full, dropping frames");
                }
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Check if this observer is still connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Frames dropped for this observer so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
