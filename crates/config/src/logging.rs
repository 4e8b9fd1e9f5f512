//! `[log]` section
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//! ```

use serde::Deserialize;

/// Verbosity of the server's own log
///
/// `trace` logs one line per observed request; `debug` adds observer
/// subscriptions and finalized seconds.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Filter directive for this level
    ///
    /// HTTP stack internals stay at `info` when the level is more verbose,
    /// so per-request lines are not buried under connection chatter.
    pub fn directive(&self) -> String {
        match self {
            Self::Trace | Self::Debug => format!("{0},hyper=info,h2=info", self.as_str()),
            _ => self.as_str().to_string(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}
