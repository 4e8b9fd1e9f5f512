//! Error types for the hub crate

use thiserror::Error;

/// Errors that can occur when managing observers
#[derive(Error, Debug)]
pub enum HubError {
    /// Maximum observers reached
    #[error("maximum observers reached ({max})")]
    MaxObservers { max: usize },

    /// Observer not found
    #[error("observer not found: {id}")]
    ObserverNotFound { id: u64 },

    /// Message could not be encoded
    #[error("failed to encode push message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;
