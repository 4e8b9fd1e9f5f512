//! Push message wire format
//!
//! Every message is a JSON object tagged with `type`:
//!
//! - `connection` - sent once, immediately on subscribe
//! - `request` - sent for every inbound request
//! - `response` - sent when a response completes
//! - `stats` - sent once per finalized second (and on connect, with
//!   `rpsHistory`)
//!
//! Timestamps are ISO-8601 UTC strings with millisecond precision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use dstats_stats::{CountMap, StatsSnapshot};

/// Welcome text of the `connection` message
pub const WELCOME_MESSAGE: &str = "Connected to DStats monitoring";

/// Format a timestamp the way observers expect (`2024-01-01T00:00:00.000Z`)
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A message pushed to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PushMessage {
    /// Greeting sent once on subscribe
    Connection { message: String, timestamp: String },

    /// An inbound request was observed
    Request {
        method: String,
        url: String,
        ip: String,
        user_agent: String,
        timestamp: String,
    },

    /// A response was finalized
    Response {
        method: String,
        url: String,
        status_code: u16,
        /// Milliseconds between request arrival and response completion
        duration: u64,
        timestamp: String,
    },

    /// Aggregate snapshot
    Stats(StatsMessage),
}

/// Body of a `stats` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsMessage {
    pub rps: u64,
    /// Only present in the on-connect snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rps_history: Option<Vec<u64>>,
    pub total_requests: u64,
    pub requests_blocked: u64,
    pub requests_bypassed: u64,
    pub methods: CountMap,
    pub status_codes: CountMap,
    pub traffic_sources: CountMap,
    /// Distinct client identities
    pub ips: usize,
    pub timestamp: String,
}

impl PushMessage {
    /// Greeting for a new observer
    pub fn connection(at: DateTime<Utc>) -> Self {
        Self::Connection {
            message: WELCOME_MESSAGE.to_string(),
            timestamp: iso_timestamp(at),
        }
    }

    /// Inbound request event
    pub fn request(
        method: &str,
        url: &str,
        ip: &str,
        user_agent: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::Request {
            method: method.to_string(),
            url: url.to_string(),
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            timestamp: iso_timestamp(at),
        }
    }

    /// Completed response event
    pub fn response(
        method: &str,
        url: &str,
        status_code: u16,
        duration_ms: u64,
        at: DateTime<Utc>,
    ) -> Self {
        Self::Response {
            method: method.to_string(),
            url: url.to_string(),
            status_code,
            duration: duration_ms,
            timestamp: iso_timestamp(at),
        }
    }

    /// Stats snapshot; `with_history` adds `rpsHistory` (on-connect variant)
    pub fn stats(snapshot: &StatsSnapshot, with_history: bool) -> Self {
        Self::Stats(StatsMessage {
            rps: snapshot.rps,
            rps_history: with_history.then(|| snapshot.rps_history.clone()),
            total_requests: snapshot.total_requests,
            requests_blocked: snapshot.requests_blocked,
            requests_bypassed: snapshot.requests_bypassed,
            methods: snapshot.methods.clone(),
            status_codes: snapshot.status_codes.clone(),
            traffic_sources: snapshot.traffic_sources.clone(),
            ips: snapshot.unique_ips,
            timestamp: iso_timestamp(snapshot.generated_at),
        })
    }

    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Request { .. } => "request",
            Self::Response { .. } => "response",
            Self::Stats(_) => "stats",
        }
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
