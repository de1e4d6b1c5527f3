//! Utilization samples as reported by the metric source.

use serde::{Deserialize, Serialize};

use crate::error::TierResult;
use crate::tier::Tier;

/// One CPU observation for the managed database.
///
/// `moving_avg_cpu_percent` is averaged over `data_points` rows. Percent
/// values are nominally within `0..=100`, which is assumed but not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    /// End of the observation interval (unix seconds).
    pub timestamp: u64,
    /// Raw tier label as reported by the database, e.g. `HS_Gen5_8`.
    pub service_objective: String,
    pub avg_cpu_percent: f64,
    pub moving_avg_cpu_percent: f64,
    /// Number of rows the moving average was computed over.
    pub data_points: u32,
}

impl UtilizationSample {
    /// Decode the reported tier label.
    pub fn tier(&self) -> TierResult<Tier> {
        Tier::parse(&self.service_objective)
    }
}
