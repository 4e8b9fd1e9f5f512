//! Illustrative blocked/bypassed estimates
//!
//! A busy second (strictly above the threshold) accrues `floor(rps * ratio)`
//! to each estimate. These are dashboard figures derived from volume only:
//! they never reject, delay or otherwise touch a request, and they are never
//! subtracted from the request total.

use dstats_config::EstimatesConfig;

/// Ratios are held in thousandths so the floor is exact integer arithmetic
const PER_MILLE: u64 = 1000;

/// Estimate increments for one finalized second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Estimate {
    pub blocked: u64,
    pub bypassed: u64,
}

/// Volume-based estimate heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatePolicy {
    threshold_rps: u64,
    blocked_per_mille: u64,
    bypassed_per_mille: u64,
}

impl EstimatePolicy {
    /// Create a policy; ratios are clamped to `[0, 1]` and rounded to 0.001
    pub fn new(threshold_rps: u64, blocked_ratio: f64, bypassed_ratio: f64) -> Self {
        Self {
            threshold_rps,
            blocked_per_mille: to_per_mille(blocked_ratio),
            bypassed_per_mille: to_per_mille(bypassed_ratio),
        }
    }

    /// Build from the `[estimates]` config section
    pub fn from_config(config: &EstimatesConfig) -> Self {
        Self::new(
            config.threshold_rps,
            config.blocked_ratio,
            config.bypassed_ratio,
        )
    }

    /// Estimate increments for a finalized second with `rps` requests
    pub fn estimate(&self, rps: u64) -> Estimate {
        if rps <= self.threshold_rps {
            return Estimate::default();
        }

        Estimate {
            blocked: rps.saturating_mul(self.blocked_per_mille) / PER_MILLE,
            bypassed: rps.saturating_mul(self.bypassed_per_mille) / PER_MILLE,
        }
    }
}

impl Default for EstimatePolicy {
    fn default() -> Self {
        Self::from_config(&EstimatesConfig::default())
    }
}

fn to_per_mille(ratio: f64) -> u64 {
    (ratio.clamp(0.0, 1.0) * PER_MILLE as f64).round() as u64
}
