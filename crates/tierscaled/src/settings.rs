//! Effective daemon settings: tierscale.toml layered under CLI flags and
//! `TIERSCALE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::debug;

use tierscale_core::config::{
    ControllerConfig, DEFAULT_JOURNAL_KEEP, ExecutorConfig, PolicyConfig,
};
use tierscale_core::{ScalingPolicy, TierscaleConfig};

/// Policy overrides. Each flag falls back to its environment variable.
#[derive(Debug, Clone, Default, Args)]
pub struct PolicyArgs {
    /// Lowest vCore count the autoscaler may scale down to.
    #[arg(long, env = "TIERSCALE_MIN_CORES", global = true)]
    pub min_cores: Option<u32>,

    /// Highest vCore count the autoscaler may scale up from.
    #[arg(long, env = "TIERSCALE_MAX_CORES", global = true)]
    pub max_cores: Option<u32>,

    /// Scale up above this moving-average CPU percent.
    #[arg(long, env = "TIERSCALE_HIGH_THRESHOLD", global = true)]
    pub high_threshold: Option<f64>,

    /// Scale down below this moving-average CPU percent.
    #[arg(long, env = "TIERSCALE_LOW_THRESHOLD", global = true)]
    pub low_threshold: Option<f64>,

    /// Rows required behind the moving average before acting.
    #[arg(long, env = "TIERSCALE_REQUIRED_DATA_POINTS", global = true)]
    pub required_data_points: Option<u32>,
}

impl From<&PolicyArgs> for PolicyConfig {
    fn from(args: &PolicyArgs) -> Self {
        PolicyConfig {
            min_cores: args.min_cores,
            max_cores: args.max_cores,
            high_threshold: args.high_threshold,
            low_threshold: args.low_threshold,
            required_data_points: args.required_data_points,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: ScalingPolicy,
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub apply_timeout: Duration,
    pub dry_run: bool,
    pub source_path: Option<PathBuf>,
    pub executor: Option<ExecutorConfig>,
    pub journal_path: Option<PathBuf>,
    /// Newest journal entries to retain.
    pub journal_keep: usize,
}

impl Settings {
    /// Load the config file (if any) and apply overrides.
    pub fn load(
        config_path: Option<&Path>,
        policy_args: &PolicyArgs,
        source: Option<PathBuf>,
        journal: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let file = match config_path {
            Some(path) => TierscaleConfig::from_file(path)?,
            None => TierscaleConfig::default(),
        };
        Self::resolve(file, policy_args, source, journal)
    }

    pub fn resolve(
        file: TierscaleConfig,
        policy_args: &PolicyArgs,
        source: Option<PathBuf>,
        journal: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let controller: ControllerConfig = file.controller();
        let policy = file
            .policy
            .overlay(PolicyConfig::from(policy_args))
            .resolve()
            .context("invalid scaling policy")?;

        let journal_keep = match &file.journal {
            Some(journal) => journal.keep()?,
            None => DEFAULT_JOURNAL_KEEP,
        };

        let settings = Settings {
            policy,
            interval: controller.interval()?,
            fetch_timeout: controller.fetch_timeout()?,
            apply_timeout: controller.apply_timeout()?,
            dry_run: controller.dry_run(),
            source_path: source.or_else(|| file.source.map(|s| PathBuf::from(s.path))),
            executor: file.executor,
            journal_path: journal.or_else(|| file.journal.map(|j| PathBuf::from(j.path))),
            journal_keep,
        };
        debug!(?settings, "settings resolved");
        Ok(settings)
    }
}
