//! BroadcastHub - the fan-out point for live observers
//!
//! `BroadcastHub` is shared by the interceptor (per-request events), the
//! ticker (per-second stats) and the observer endpoint (subscriptions). It
//! provides:
//!
//! - Zero-cost broadcast when no observers are connected (inline check)
//! - Encode once, `try_send` to each observer, never await
//! - Greeting frames queued before an observer becomes visible to broadcasts
//! - Periodic cleanup of disconnected observers
//!
//! # Usage
//!
//! ```ignore
//! let hub = Arc::new(BroadcastHub::new(1024, 256));
//!
//! // Hot path:
//! hub.broadcast(&PushMessage::response("GET", "/", 200, 3, Utc::now()));
//!
//! // For new connections:
//! let (id, rx) = hub.subscribe_with(|| vec![PushMessage::connection(Utc::now())])?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dstats_config::HubConfig;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{HubError, Result};
use crate::observer::{Delivery, Frame, Observer};
use crate::protocol::PushMessage;

/// Interval for cleanup of disconnected observers
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// The broadcast point for live observers
#[derive(Debug)]
pub struct BroadcastHub {
    /// Active observers
    observers: RwLock<Vec<Arc<Observer>>>,
    /// Quick check flag for hot path
    has_observers: AtomicBool,
    /// Maximum concurrent observers
    max_observers: usize,
    /// Per-observer channel capacity
    buffer_size: usize,
    /// Messages broadcast while observers were connected
    broadcasts: AtomicU64,
    /// Frames queued to observers
    frames_sent: AtomicU64,
    /// Frames dropped on full observer buffers
    frames_dropped: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub accepting up to `max_observers`, each buffering
    /// `buffer_size` frames
    pub fn new(max_observers: usize, buffer_size: usize) -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            has_observers: AtomicBool::new(false),
            max_observers,
            buffer_size: buffer_size.max(1),
            broadcasts: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Build from the `[hub]` config section
    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.max_observers, config.observer_buffer)
    }

    /// Deliver a message to every open observer
    ///
    /// Returns the number of observers the frame was queued for. Closed
    /// observers are skipped and full buffers drop the frame; neither is an
    /// error for the caller.
    pub fn broadcast(&self, message: &PushMessage) -> usize {
        // Fast path: no observers = no encoding, no locking
        if !self.has_observers.load(Ordering::Relaxed) {
            return 0;
        }

        let frame = match encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, kind = message.kind(), "dropping unencodable message");
                return 0;
            }
        };

        self.broadcasts.fetch_add(1, Ordering::Relaxed);

        let observers = self.observers.read();
        let mut sent = 0;
        let mut dropped = 0;

        for observer in observers.iter() {
            match observer.try_send(Arc::clone(&frame)) {
                Delivery::Sent => sent += 1,
                Delivery::Dropped => dropped += 1,
                Delivery::Closed => {}
            }
        }
        drop(observers);

        self.frames_sent.fetch_add(sent as u64, Ordering::Relaxed);
        if dropped > 0 {
            self.frames_dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        trace!(kind = message.kind(), sent, dropped, "broadcast");

        sent
    }

    /// Register a new observer
    ///
    /// `greeting` is evaluated and queued on the new channel while the
    /// observer list is locked, so the greeting frames precede every
    /// broadcast the observer receives.
    ///
    /// Returns the observer ID and the receiving half of its channel.
    pub fn subscribe_with<F>(&self, greeting: F) -> Result<(u64, mpsc::Receiver<Frame>)>
    where
        F: FnOnce() -> Vec<PushMessage>,
    {
        let mut observers = self.observers.write();

        // Closed observers no longer count toward the cap
        observers.retain(|o| o.is_connected());

        if observers.len() >= self.max_observers {
            return Err(HubError::MaxObservers {
                max: self.max_observers,
            });
        }

        let frames = greeting()
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>>>()?;

        let (sender, receiver) = mpsc::channel(self.buffer_size.max(frames.len()));
        let observer = Arc::new(Observer::new(sender));

        for frame in frames {
            // Fresh channel sized for the greeting, cannot be full
            observer.try_send(frame);
        }

        let id = observer.id();
        observers.push(observer);
        self.has_observers.store(true, Ordering::Relaxed);

        debug!(id, observers = observers.len(), "observer subscribed");
        Ok((id, receiver))
    }

    /// Register a new observer with no greeting
    pub fn subscribe(&self) -> Result<(u64, mpsc::Receiver<Frame>)> {
        self.subscribe_with(Vec::new)
    }

    /// Remove an observer by ID
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        let mut observers = self.observers.write();
        let original_len = observers.len();
        observers.retain(|o| o.id() != id);

        if observers.len() == original_len {
            return Err(HubError::ObserverNotFound { id });
        }

        if observers.is_empty() {
            self.has_observers.store(false, Ordering::Relaxed);
        }

        debug!(id, "observer removed");
        Ok(())
    }

    /// Get the number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Check if there are any observers
    #[inline]
    pub fn has_observers(&self) -> bool {
        self.has_observers.load(Ordering::Relaxed)
    }

    /// Remove observers whose connection has gone away
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup_disconnected(&self) -> usize {
        let mut observers = self.observers.write();
        let original_len = observers.len();
        observers.retain(|o| o.is_connected());
        let removed = original_len - observers.len();

        if observers.is_empty() {
            self.has_observers.store(false, Ordering::Relaxed);
        }

        if removed > 0 {
            debug!(removed, "cleaned up disconnected observers");
        }

        removed
    }

    /// Get delivery statistics
    pub fn stats(&self) -> HubStats {
        HubStats {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            observers: self.observer_count(),
        }
    }

    /// Spawn the maintenance task
    ///
    /// Removes disconnected observers every 5 seconds until `cancel` fires.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        hub.cleanup_disconnected();
                    }
                }
            }
        })
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::from_config(&HubConfig::default())
    }
}

fn encode(message: &PushMessage) -> Result<Frame> {
    Ok(Arc::from(serde_json::to_string(message)?))
}

/// Statistics about the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Messages broadcast while observers were connected
    pub broadcasts: u64,
    /// Frames queued to observers
    pub frames_sent: u64,
    /// Frames dropped on full observer buffers
    pub frames_dropped: u64,
    /// Current number of observers
    pub observers: usize,
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
