//! Journal record types.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use tierscale_core::{Action, Decision, Tier, UtilizationSample};

/// What happened to the decision after the engine returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyStatus {
    /// The decision was a hold; nothing to apply.
    NotRequested,
    /// The executor accepted the target tier.
    Applied,
    /// Dry-run mode: the change was logged but not applied.
    DryRun,
    /// The executor failed or timed out.
    Failed { error: String },
}

/// One recorded evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Assigned by the journal on insert.
    pub seq: u64,
    /// When the entry was recorded (unix seconds).
    pub recorded_at: u64,
    pub sample: UtilizationSample,
    pub decision: Decision,
    pub status: ApplyStatus,
}

impl JournalEntry {
    pub fn new(sample: UtilizationSample, decision: Decision, status: ApplyStatus) -> Self {
        Self {
            seq: 0,
            recorded_at: epoch_secs(),
            sample,
            decision,
            status,
        }
    }

    /// Tier the autoscaler asked for, or `None` for a hold.
    pub fn requested_tier(&self) -> Option<Tier> {
        self.decision.requested()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Lifetime totals over every entry ever recorded, pruned ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTotals {
    pub scale_up: u64,
    pub scale_down: u64,
    pub hold: u64,
    pub apply_failures: u64,
}

impl JournalTotals {
    pub fn decisions(&self, action: Action) -> u64 {
        match action {
            Action::ScaleUp => self.scale_up,
            Action::ScaleDown => self.scale_down,
            Action::Hold => self.hold,
        }
    }
}
