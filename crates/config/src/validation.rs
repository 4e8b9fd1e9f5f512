//! Configuration validation
//!
//! Rejects values that would make the service misbehave at runtime:
//! - zero-length intervals, windows and rankings
//! - estimate ratios outside `[0, 1]` or finer than 0.001
//! - observer buffers too small to hold the greeting frames

use crate::Config;
use crate::error::{ConfigError, Result};

/// A new observer receives a welcome frame and a full snapshot up front
const GREETING_FRAMES: usize = 2;

/// Estimate ratios are applied in thousandths
const RATIO_STEPS: f64 = 1000.0;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_stats(config)?;
    validate_estimates(config)?;
    validate_hub(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "port",
            "must be greater than 0",
        ));
    }
    if config.server.host.trim().is_empty() {
        return Err(ConfigError::invalid_value("server", "host", "must not be empty"));
    }
    Ok(())
}

fn validate_stats(config: &Config) -> Result<()> {
    let stats = &config.stats;

    if stats.tick_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "stats",
            "tick_interval",
            "must be greater than 0",
        ));
    }

    for (field, value) in [
        ("history_len", stats.history_len),
        ("top_user_agents", stats.top_user_agents),
        ("max_keys_per_category", stats.max_keys_per_category),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid_value(
                "stats",
                field,
                "must be greater than 0",
            ));
        }
    }

    Ok(())
}

fn validate_estimates(config: &Config) -> Result<()> {
    let estimates = &config.estimates;

    for (field, ratio) in [
        ("blocked_ratio", estimates.blocked_ratio),
        ("bypassed_ratio", estimates.bypassed_ratio),
    ] {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::invalid_value(
                "estimates",
                field,
                format!("must be between 0 and 1, got {}", ratio),
            ));
        }

        let steps = ratio * RATIO_STEPS;
        if (steps - steps.round()).abs() > 1e-6 {
            return Err(ConfigError::invalid_value(
                "estimates",
                field,
                format!("must have at most three decimal places, got {}", ratio),
            ));
        }
    }

    Ok(())
}

fn validate_hub(config: &Config) -> Result<()> {
    if config.hub.max_observers == 0 {
        return Err(ConfigError::invalid_value(
            "hub",
            "max_observers",
            "must be greater than 0",
        ));
    }

    if config.hub.observer_buffer < GREETING_FRAMES {
        return Err(ConfigError::invalid_value(
            "hub",
            "observer_buffer",
            format!("must be at least {}", GREETING_FRAMES),
        ));
    }

    Ok(())
}
