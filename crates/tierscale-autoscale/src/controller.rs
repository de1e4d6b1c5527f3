//! Controller — the periodic fetch → decide → apply → record loop.
//!
//! One controller manages one database. Each tick fetches a fresh sample,
//! asks the [`DecisionEngine`] for a decision, applies a tier change through
//! the [`TierExecutor`] when one is recommended, records the outcome in the
//! journal, and emits gauges. Failures abort the tick and are logged; the
//! next tick starts again from fresh data.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use tierscale_core::{Action, Reason, ScalingPolicy, Tier, TierError};
use tierscale_metrics::DecisionGauges;
use tierscale_state::{ApplyStatus, Journal, JournalEntry};

use crate::engine::DecisionEngine;
use crate::executor::TierExecutor;
use crate::source::MetricSource;

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The metric source had nothing to report; treated as a hold.
    NoData,
    /// A sample was evaluated.
    Evaluated(JournalEntry),
}

pub struct Controller {
    engine: DecisionEngine,
    policy: ScalingPolicy,
    source: Arc<dyn MetricSource>,
    executor: Arc<dyn TierExecutor>,
    journal: Option<Journal>,
    retain: Option<usize>,
    fetch_timeout: Duration,
    apply_timeout: Duration,
}

impl Controller {
    pub fn new(
        engine: DecisionEngine,
        policy: ScalingPolicy,
        source: Arc<dyn MetricSource>,
        executor: Arc<dyn TierExecutor>,
    ) -> Self {
        Self {
            engine,
            policy,
            source,
            executor,
            journal: None,
            retain: None,
            fetch_timeout: Duration::from_secs(10),
            apply_timeout: Duration::from_secs(300),
        }
    }

    /// Record every evaluation in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Prune the journal to the newest `keep` entries after each record.
    pub fn with_retention(mut self, keep: usize) -> Self {
        self.retain = Some(keep);
        self
    }

    pub fn with_timeouts(mut self, fetch: Duration, apply: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.apply_timeout = apply;
        self
    }

    pub fn policy(&self) -> &ScalingPolicy {
        &self.policy
    }

    /// Run one evaluation.
    ///
    /// Takes `&mut self` so a single controller can never have two tier
    /// changes in flight.
    pub async fn tick(&mut self) -> anyhow::Result<Outcome> {
        let sample = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .context("metric fetch timed out")?
            .context("metric fetch failed")?;

        let Some(sample) = sample else {
            info!("no information received from metric source; holding");
            return Ok(Outcome::NoData);
        };

        let decision = self.engine.decide_sample(&sample, &self.policy)?;

        let status = match decision.action {
            Action::Hold => {
                if decision.reason == Reason::InsufficientData {
                    info!(
                        data_points = sample.data_points,
                        required = self.policy.required_data_points,
                        "not enough data points"
                    );
                }
                ApplyStatus::NotRequested
            }
            Action::ScaleUp | Action::ScaleDown => {
                info!(
                    action = %decision.action,
                    from = %decision.current,
                    to = %decision.target,
                    moving_avg = sample.moving_avg_cpu_percent,
                    "{}: scaling to {}",
                    decision.reason,
                    decision.target
                );
                self.apply(&decision.target).await
            }
        };

        let mut entry = JournalEntry::new(sample, decision, status);
        if let Some(journal) = &self.journal {
            match journal.record(entry.clone()) {
                Ok(recorded) => entry = recorded,
                Err(e) => warn!(error = %e, "failed to record decision"),
            }
            if let Some(keep) = self.retain {
                match journal.prune(keep) {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, keep, "journal trimmed"),
                    Err(e) => warn!(error = %e, "failed to prune journal"),
                }
            }
        }

        DecisionGauges::from_entry(&entry).emit();
        Ok(Outcome::Evaluated(entry))
    }

    async fn apply(&self, target: &Tier) -> ApplyStatus {
        let dry_run = self.executor.is_dry_run();
        match tokio::time::timeout(self.apply_timeout, self.executor.apply(target)).await {
            Ok(Ok(())) if dry_run => ApplyStatus::DryRun,
            Ok(Ok(())) => ApplyStatus::Applied,
            Ok(Err(e)) => {
                warn!(target_tier = %target, error = %e, "tier change failed");
                ApplyStatus::Failed {
                    error: format!("{e:#}"),
                }
            }
            Err(_) => {
                warn!(
                    target_tier = %target,
                    timeout_secs = self.apply_timeout.as_secs(),
                    "tier change timed out"
                );
                ApplyStatus::Failed {
                    error: "timed out".to_string(),
                }
            }
        }
    }

    /// Run the controller loop until `shutdown` flips.
    pub async fn run(
        &mut self,
        interval: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        info!(
            interval_secs = interval.as_secs(),
            min_cores = self.policy.min_cores,
            max_cores = self.policy.max_cores,
            high = self.policy.high_threshold,
            low = self.policy.low_threshold,
            required_data_points = self.policy.required_data_points,
            "autoscaler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.tick().await {
                        log_tick_error(&e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("autoscaler shutting down");
                    break;
                }
            }
        }
    }
}

/// Catalog mismatches are configuration problems and logged loudly;
/// malformed labels and fetch failures are expected to clear on their own.
fn log_tick_error(e: &anyhow::Error) {
    match e.downcast_ref::<TierError>() {
        Some(TierError::UnknownGeneration(_) | TierError::TierNotInCatalog(_)) => {
            error!(error = %e, "tier is not in the autoscaler catalog; skipping cycle");
        }
        Some(_) => warn!(error = %e, "could not decode current tier; skipping cycle"),
        None => warn!(error = %format!("{e:#}"), "autoscaler evaluation failed"),
    }
}
