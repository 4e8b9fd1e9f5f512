//! Illustrative blocked/bypassed estimate configuration
//!
//! These numbers only shape dashboard telemetry. Nothing in the request
//! path consults them and no request is ever rejected because of them.

use serde::Deserialize;

/// Estimate heuristic settings
///
/// # Example
///
/// ```toml
/// [estimates]
/// threshold_rps = 50
/// blocked_ratio = 0.3
/// bypassed_ratio = 0.1
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatesConfig {
    /// Estimates accrue only for seconds strictly above this rate
    /// Default: 50
    pub threshold_rps: u64,

    /// Share of a busy second reported as "blocked", in steps of 0.001
    /// Default: 0.3
    pub blocked_ratio: f64,

    /// Share of a busy second reported as "bypassed", in steps of 0.001
    /// Default: 0.1
    pub bypassed_ratio: f64,
}

impl Default for EstimatesConfig {
    fn default() -> Self {
        Self {
            threshold_rps: 50,
            blocked_ratio: 0.3,
            bypassed_ratio: 0.1,
        }
    }
}
