//! DStats Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use dstats_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 8080").unwrap();
//! assert_eq!(config.server.port, 8080);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 6969
//! static_dir = "public"
//! trust_forwarded = true
//!
//! [stats]
//! tick_interval = "100ms"
//! history_len = 20
//! top_user_agents = 5
//! max_keys_per_category = 10000
//!
//! [estimates]
//! threshold_rps = 50
//! blocked_ratio = 0.3
//! bypassed_ratio = 0.1
//!
//! [hub]
//! max_observers = 1024
//! observer_buffer = 256
//! ```

mod error;
mod estimates;
mod hub;
mod logging;
mod server;
mod stats;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use estimates::EstimatesConfig;
pub use hub::HubConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::ServerConfig;
pub use stats::StatsConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// HTTP server settings (bind address, static files)
    pub server: ServerConfig,

    /// Counter aggregation and ticker cadence
    pub stats: StatsConfig,

    /// Illustrative blocked/bypassed estimate heuristic
    pub estimates: EstimatesConfig,

    /// Observer fan-out limits
    pub hub: HubConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.port, 6969);
        assert_eq!(config.stats.tick_interval, Duration::from_millis(100));
        assert_eq!(config.stats.history_len, 20);
        assert_eq!(config.stats.top_user_agents, 5);
        assert_eq!(config.estimates.threshold_rps, 50);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[server]
host = "127.0.0.1"
port = 8080
static_dir = "public"
trust_forwarded = false

[stats]
tick_interval = "250ms"
history_len = 60
top_user_agents = 10
max_keys_per_category = 500

[estimates]
threshold_rps = 100
blocked_ratio = 0.5
bypassed_ratio = 0.2

[hub]
max_observers = 8
observer_buffer = 16
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(
            config.server.static_dir.as_deref(),
            Some(Path::new("public"))
        );
        assert!(!config.server.trust_forwarded);
        assert_eq!(config.stats.tick_interval, Duration::from_millis(250));
        assert_eq!(config.stats.history_len, 60);
        assert_eq!(config.stats.top_user_agents, 10);
        assert_eq!(config.stats.max_keys_per_category, 500);
        assert_eq!(config.estimates.threshold_rps, 100);
        assert_eq!(config.hub.max_observers, 8);
        assert_eq!(config.hub.observer_buffer, 16);
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = Config::from_str(include_str!("../../../configs/config.toml")).unwrap();
        assert_eq!(config.server.port, 6969);
        assert_eq!(config.hub.observer_buffer, 256);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("[server\nport = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[stats]\nhistory_len = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/dstats.toml");
        match result {
            Err(ConfigError::IoError { path, .. }) => assert!(path.contains("dstats.toml")),
            other => panic!("expected IoError, got {:?}", other),
        }
    }
}
