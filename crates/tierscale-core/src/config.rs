//! tierscale.toml configuration parser.
//!
//! ```toml
//! [policy]
//! min_cores = 2
//! max_cores = 16
//! high_threshold = 70.0
//! low_threshold = 20.0
//! required_data_points = 5
//!
//! [controller]
//! interval = "15s"
//! fetch_timeout = "10s"
//! apply_timeout = "5m"
//! dry_run = false
//!
//! [source]
//! path = "/var/lib/tierscale/resource_stats.jsonl"
//!
//! [executor]
//! command = "/usr/local/bin/set-service-objective"
//! args = ["--database", "orders"]
//!
//! [journal]
//! path = "/var/lib/tierscale/journal.redb"
//! keep = 10000
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::policy::ScalingPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierscaleConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    pub controller: Option<ControllerConfig>,
    pub source: Option<SourceConfig>,
    pub executor: Option<ExecutorConfig>,
    pub journal: Option<JournalConfig>,
}

/// Policy fields as written in the file. Missing fields fall back to
/// [`ScalingPolicy::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub min_cores: Option<u32>,
    pub max_cores: Option<u32>,
    pub high_threshold: Option<f64>,
    pub low_threshold: Option<f64>,
    pub required_data_points: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub interval: Option<String>,
    pub fetch_timeout: Option<String>,
    pub apply_timeout: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON-lines file of resource-stat rows.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub command: String,
    pub args: Option<Vec<String>>,
}

/// Entries kept when `[journal].keep` is not set: about 42 hours at the
/// default interval.
pub const DEFAULT_JOURNAL_KEEP: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    pub path: String,
    /// Newest entries to retain; older ones are pruned after each record.
    pub keep: Option<usize>,
}

impl JournalConfig {
    pub fn keep(&self) -> anyhow::Result<usize> {
        match self.keep {
            Some(0) => bail!("[journal].keep must be at least 1"),
            Some(n) => Ok(n),
            None => Ok(DEFAULT_JOURNAL_KEEP),
        }
    }
}

impl TierscaleConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn controller(&self) -> ControllerConfig {
        self.controller.clone().unwrap_or_default()
    }
}

impl PolicyConfig {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn overlay(self, overrides: PolicyConfig) -> PolicyConfig {
        PolicyConfig {
            min_cores: overrides.min_cores.or(self.min_cores),
            max_cores: overrides.max_cores.or(self.max_cores),
            high_threshold: overrides.high_threshold.or(self.high_threshold),
            low_threshold: overrides.low_threshold.or(self.low_threshold),
            required_data_points: overrides.required_data_points.or(self.required_data_points),
        }
    }

    /// Fill defaults and validate.
    pub fn resolve(&self) -> Result<ScalingPolicy, PolicyError> {
        let defaults = ScalingPolicy::default();
        let policy = ScalingPolicy {
            min_cores: self.min_cores.unwrap_or(defaults.min_cores),
            max_cores: self.max_cores.unwrap_or(defaults.max_cores),
            high_threshold: self.high_threshold.unwrap_or(defaults.high_threshold),
            low_threshold: self.low_threshold.unwrap_or(defaults.low_threshold),
            required_data_points: self
                .required_data_points
                .unwrap_or(defaults.required_data_points),
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl ControllerConfig {
    pub fn interval(&self) -> anyhow::Result<Duration> {
        let interval = duration_or(self.interval.as_deref(), Duration::from_secs(15))?;
        if interval.is_zero() {
            bail!("[controller].interval must be greater than zero");
        }
        Ok(interval)
    }

    pub fn fetch_timeout(&self) -> anyhow::Result<Duration> {
        duration_or(self.fetch_timeout.as_deref(), Duration::from_secs(10))
    }

    pub fn apply_timeout(&self) -> anyhow::Result<Duration> {
        duration_or(self.apply_timeout.as_deref(), Duration::from_secs(300))
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }
}

fn duration_or(value: Option<&str>, default: Duration) -> anyhow::Result<Duration> {
    match value {
        Some(s) => parse_duration(s),
        None => Ok(default),
    }
}

/// Parse a duration string like "30s", "5m", "1h", or a bare second count.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let (digits, scale) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600)
    } else {
        (s, 1)
    };
    if digits.is_empty() {
        bail!("invalid duration '{s}'");
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid duration '{s}'");
    }
    let n: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration '{s}'"))?;
    let secs = n
        .checked_mul(scale)
        .with_context(|| format!("duration '{s}' is too large"))?;
    Ok(Duration::from_secs(secs))
}
