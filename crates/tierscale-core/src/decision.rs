//! Engine output: the recommended action, its target, and why.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// What the caller should do with the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ScaleUp,
    ScaleDown,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ScaleUp => write!(f, "scale_up"),
            Action::ScaleDown => write!(f, "scale_down"),
            Action::Hold => write!(f, "hold"),
        }
    }
}

/// Why a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Moving average above the high threshold.
    HighThreshold,
    /// Moving average below the low threshold.
    LowThreshold,
    /// Fewer rows behind the moving average than the policy requires.
    InsufficientData,
    /// Moving average between the thresholds.
    WithinBand,
    /// High threshold reached but the tier is already at `max_cores`.
    AtMaxCores,
    /// Low threshold reached but the tier is already at `min_cores`.
    AtMinCores,
    /// High threshold reached but the tier is the last in its list.
    NoLargerTier,
    /// Low threshold reached but the tier is the first in its list.
    NoSmallerTier,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::HighThreshold => "high threshold reached",
            Reason::LowThreshold => "low threshold reached",
            Reason::InsufficientData => "insufficient data points",
            Reason::WithinBand => "within band",
            Reason::AtMaxCores => "already at max cores",
            Reason::AtMinCores => "already at min cores",
            Reason::NoLargerTier => "no larger tier in catalog",
            Reason::NoSmallerTier => "no smaller tier in catalog",
        };
        f.write_str(text)
    }
}

/// Engine output. `target == current` whenever `action` is `Hold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub current: Tier,
    pub target: Tier,
    pub reason: Reason,
}

impl Decision {
    pub fn hold(current: Tier, reason: Reason) -> Self {
        Self {
            action: Action::Hold,
            current,
            target: current,
            reason,
        }
    }

    /// Target to apply, or `None` for a hold.
    pub fn requested(&self) -> Option<Tier> {
        self.is_change().then_some(self.target)
    }

    /// True when the caller should apply `target`.
    pub fn is_change(&self) -> bool {
        self.action != Action::Hold
    }
}
