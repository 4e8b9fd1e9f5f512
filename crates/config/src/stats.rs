//! Counter aggregation configuration

use std::time::Duration;

use serde::Deserialize;

/// Counter store and ticker configuration
///
/// # Example
///
/// ```toml
/// [stats]
/// tick_interval = "100ms"
/// history_len = 20
/// top_user_agents = 5
/// max_keys_per_category = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// How often the ticker checks for a second-boundary crossing
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Number of per-second RPS samples kept in the sliding window
    /// Default: 20
    pub history_len: usize,

    /// Length of the top user-agent ranking in the query endpoint
    /// Default: 5
    pub top_user_agents: usize,

    /// Distinct keys tracked per category (ip, user agent, referer, ...)
    /// before new keys are folded into the overflow bucket
    /// Default: 10000
    pub max_keys_per_category: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            history_len: 20,
            top_user_agents: 5,
            max_keys_per_category: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humantime_interval() {
        let config: StatsConfig = toml::from_str("tick_interval = \"1s\"").unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.history_len, 20);
    }
}
