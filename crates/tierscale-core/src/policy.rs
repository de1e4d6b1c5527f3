//! Scaling policy: core bounds, CPU thresholds, and the sufficiency gate.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Bounds and thresholds the decision engine evaluates a sample against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Never scale below this many vCores (inclusive).
    pub min_cores: u32,
    /// Never scale above this many vCores (inclusive).
    pub max_cores: u32,
    /// Scale up when the moving average is strictly above this percent.
    pub high_threshold: f64,
    /// Scale down when the moving average is strictly below this percent.
    pub low_threshold: f64,
    /// Minimum rows behind the moving average before any action is taken.
    pub required_data_points: u32,
}

impl ScalingPolicy {
    /// Check the policy invariants.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_cores > self.max_cores {
            return Err(PolicyError::CoreBounds {
                min: self.min_cores,
                max: self.max_cores,
            });
        }
        let thresholds_ok = self.low_threshold >= 0.0
            && self.low_threshold < self.high_threshold
            && self.high_threshold <= 100.0;
        if !thresholds_ok {
            return Err(PolicyError::Thresholds {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        if self.required_data_points < 1 {
            return Err(PolicyError::DataPoints);
        }
        Ok(())
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_cores: 2,
            max_cores: 8,
            high_threshold: 70.0,
            low_threshold: 20.0,
            required_data_points: 5,
        }
    }
}
