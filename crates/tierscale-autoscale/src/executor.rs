//! Tier executors — apply a recommended tier to the managed database.

use std::path::PathBuf;

use anyhow::{Context, bail};
use tokio::process::Command;
use tracing::{info, warn};

use tierscale_core::Tier;

use crate::source::BoxFuture;

/// Applies a target tier. The controller never retries a failed apply; the
/// next tick re-evaluates from fresh data instead.
pub trait TierExecutor: Send + Sync {
    fn apply<'a>(&'a self, target: &'a Tier) -> BoxFuture<'a, ()>;

    /// True if `apply` only logs.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs an external program with the canonical target label appended as the
/// final argument, e.g. `set-service-objective --database orders HS_GEN5_10`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl TierExecutor for CommandExecutor {
    fn apply<'a>(&'a self, target: &'a Tier) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let label = target.label();
            let output = Command::new(&self.program)
                .args(&self.args)
                .arg(&label)
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("spawning {}", self.program.display()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    program = %self.program.display(),
                    status = %output.status,
                    stderr = %stderr.trim(),
                    "tier change command failed"
                );
                bail!("{} exited with {}", self.program.display(), output.status);
            }

            info!(program = %self.program.display(), tier = %label, "tier change submitted");
            Ok(())
        })
    }
}

/// Logs the change it would have made.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl TierExecutor for DryRunExecutor {
    fn apply<'a>(&'a self, target: &'a Tier) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            info!(tier = %target, "dry run: tier change not applied");
            Ok(())
        })
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
