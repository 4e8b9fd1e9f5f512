//! Observer fan-out configuration

use serde::Deserialize;

/// Broadcast hub limits
///
/// # Example
///
/// ```toml
/// [hub]
/// max_observers = 1024
/// observer_buffer = 256
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Maximum concurrently connected observers
    /// Default: 1024
    pub max_observers: usize,

    /// Outbound frames buffered per observer before new frames are dropped
    /// Default: 256
    pub observer_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_observers: 1024,
            observer_buffer: 256,
        }
    }
}
