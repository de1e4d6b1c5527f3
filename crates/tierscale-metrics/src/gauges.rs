//! Per-evaluation gauges.

use tracing::info;

use tierscale_core::{Decision, UtilizationSample};
use tierscale_state::JournalEntry;

/// The values reported after every evaluation that had a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionGauges {
    pub data_points: u32,
    pub avg_cpu_percent: f64,
    pub moving_avg_cpu_percent: f64,
    pub current_cores: u32,
    /// Equals `current_cores` on a hold.
    pub target_cores: u32,
}

impl DecisionGauges {
    pub fn new(sample: &UtilizationSample, decision: &Decision) -> Self {
        Self {
            data_points: sample.data_points,
            avg_cpu_percent: sample.avg_cpu_percent,
            moving_avg_cpu_percent: sample.moving_avg_cpu_percent,
            current_cores: decision.current.cores(),
            target_cores: decision.target.cores(),
        }
    }

    pub fn from_entry(entry: &JournalEntry) -> Self {
        Self::new(&entry.sample, &entry.decision)
    }

    /// Log the gauges as a single structured event.
    pub fn emit(&self) {
        info!(
            target: "tierscale::metrics",
            data_points = self.data_points,
            avg_cpu_percent = self.avg_cpu_percent,
            moving_avg_cpu_percent = self.moving_avg_cpu_percent,
            current_cores = self.current_cores,
            target_cores = self.target_cores,
            "autoscaler gauges"
        );
    }
}
