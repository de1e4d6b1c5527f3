//! tierscaled — the tierscale daemon.
//!
//! Keeps a Hyperscale database's compute tier inside a CPU band by stepping
//! it one catalog entry at a time:
//! - Metric source (resource-stat rows → moving-average sample)
//! - Decision engine (thresholds, core bounds, sufficiency gate)
//! - Executor (external command, or dry run)
//! - Decision journal (redb)
//! - HTTP API + Prometheus exposition
//!
//! # Usage
//!
//! ```text
//! tierscaled --config /etc/tierscale.toml run --port 9464
//! tierscaled decide --tier HS_Gen5_8 --moving-avg 85 --data-points 5
//! ```

mod settings;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::sync::watch;
use tracing::{error, info, warn};

use tierscale_autoscale::{
    CommandExecutor, Controller, DecisionEngine, DryRunExecutor, JsonLinesSource, Outcome,
    TierExecutor,
};
use tierscale_core::{TierCatalog, UtilizationSample};
use tierscale_state::Journal;

use crate::settings::{PolicyArgs, Settings};

#[derive(Parser)]
#[command(
    name = "tierscaled",
    about = "tierscale — CPU-driven compute tier autoscaler",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to tierscale.toml.
    #[arg(short, long, env = "TIERSCALE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// JSON-lines file of resource-stat rows (overrides [source].path).
    #[arg(long, env = "TIERSCALE_SOURCE", global = true)]
    source: Option<PathBuf>,

    /// Decision journal path (overrides [journal].path).
    #[arg(long, env = "TIERSCALE_JOURNAL", global = true)]
    journal: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(flatten)]
    policy: PolicyArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the autoscaler loop until interrupted.
    Run {
        /// Serve the HTTP API and /metrics on this port.
        #[arg(long)]
        port: Option<u16>,

        /// Log tier changes instead of applying them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single evaluation and print the outcome as JSON.
    Once {
        #[arg(long)]
        dry_run: bool,
    },
    /// Evaluate a hand-written sample without touching any database.
    Decide {
        /// Current tier label, e.g. HS_Gen5_8.
        #[arg(long)]
        tier: String,

        /// Moving-average CPU percent.
        #[arg(long)]
        moving_avg: f64,

        /// Rows behind the moving average.
        #[arg(long)]
        data_points: u32,

        /// Instantaneous CPU percent (defaults to the moving average).
        #[arg(long)]
        avg: Option<f64>,
    },
    /// Print the tier catalog.
    Catalog,
    /// Print recent journal entries, newest first.
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let settings = Settings::load(
        cli.config.as_deref(),
        &cli.policy,
        cli.source.clone(),
        cli.journal.clone(),
    )?;
    let catalog = Arc::new(TierCatalog::hyperscale());

    match cli.command {
        Command::Run { port, dry_run } => run(settings, catalog, port, dry_run).await,
        Command::Once { dry_run } => once(settings, catalog, dry_run).await,
        Command::Decide {
            tier,
            moving_avg,
            data_points,
            avg,
        } => decide(&settings, catalog, tier, moving_avg, data_points, avg),
        Command::Catalog => {
            print_catalog(&catalog);
            Ok(())
        }
        Command::History { limit } => history(&settings, limit),
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,tierscaled=debug,tierscale=debug"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn open_journal(settings: &Settings) -> anyhow::Result<Journal> {
    match &settings.journal_path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            Ok(Journal::open(path)?)
        }
        None => {
            warn!("no journal configured; decisions are kept in memory only");
            Ok(Journal::open_in_memory()?)
        }
    }
}

fn build_executor(settings: &Settings, dry_run: bool) -> Arc<dyn TierExecutor> {
    match (&settings.executor, dry_run || settings.dry_run) {
        (Some(exec), false) => Arc::new(CommandExecutor::new(
            &exec.command,
            exec.args.clone().unwrap_or_default(),
        )),
        (None, false) => {
            warn!("no executor configured; tier changes will only be logged");
            Arc::new(DryRunExecutor)
        }
        (_, true) => Arc::new(DryRunExecutor),
    }
}

fn build_controller(
    settings: &Settings,
    catalog: Arc<TierCatalog>,
    journal: Journal,
    dry_run: bool,
) -> anyhow::Result<Controller> {
    let Some(path) = &settings.source_path else {
        bail!("no metric source configured; set [source].path or --source");
    };
    let source = Arc::new(JsonLinesSource::new(
        path,
        settings.policy.required_data_points,
    ));
    let executor = build_executor(settings, dry_run);

    Ok(Controller::new(
        DecisionEngine::new(catalog),
        settings.policy.clone(),
        source,
        executor,
    )
    .with_journal(journal)
    .with_retention(settings.journal_keep)
    .with_timeouts(settings.fetch_timeout, settings.apply_timeout))
}

async fn run(
    settings: Settings,
    catalog: Arc<TierCatalog>,
    port: Option<u16>,
    dry_run: bool,
) -> anyhow::Result<()> {
    info!("tierscale daemon starting");

    let journal = open_journal(&settings)?;
    let mut controller = build_controller(&settings, catalog.clone(), journal.clone(), dry_run)?;

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let interval = settings.interval;
    let controller_handle = tokio::spawn(async move {
        controller.run(interval, shutdown_rx).await;
    });

    let wait_for_ctrl_c = shutdown_on(tokio::signal::ctrl_c(), shutdown_tx);

    // ── API server (optional) ──────────────────────────────────

    match port {
        Some(port) => {
            let router = tierscale_api::build_router(tierscale_api::ApiState {
                journal,
                catalog,
                policy: settings.policy.clone(),
            });
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            info!(%addr, "API server starting");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(wait_for_ctrl_c)
                .await?;
        }
        None => wait_for_ctrl_c.await,
    }

    let _ = controller_handle.await;
    info!("tierscale daemon stopped");
    Ok(())
}

/// Flip `shutdown` once `signal` fires.
///
/// If the signal handler cannot be installed the daemon keeps running until
/// it is killed; the sender is held so the controller loop is not woken.
async fn shutdown_on(
    signal: impl Future<Output = std::io::Result<()>>,
    shutdown: watch::Sender<bool>,
) {
    match signal.await {
        Ok(()) => {
            info!("shutdown signal received");
            let _ = shutdown.send(true);
        }
        Err(e) => {
            error!(error = %e, "failed to listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

async fn once(settings: Settings, catalog: Arc<TierCatalog>, dry_run: bool) -> anyhow::Result<()> {
    let journal = open_journal(&settings)?;
    let mut controller = build_controller(&settings, catalog, journal, dry_run)?;
    let outcome = controller.tick().await?;
    let value = match outcome {
        Outcome::NoData => json!({ "outcome": "no_data", "reason": "no data available" }),
        Outcome::Evaluated(entry) => json!({
            "outcome": "evaluated",
            "reason": entry.decision.reason.to_string(),
            "entry": entry,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn decide(
    settings: &Settings,
    catalog: Arc<TierCatalog>,
    tier: String,
    moving_avg: f64,
    data_points: u32,
    avg: Option<f64>,
) -> anyhow::Result<()> {
    let sample = UtilizationSample {
        timestamp: 0,
        service_objective: tier,
        avg_cpu_percent: avg.unwrap_or(moving_avg),
        moving_avg_cpu_percent: moving_avg,
        data_points,
    };
    let engine = DecisionEngine::new(catalog);
    let decision = engine.decide_sample(&sample, &settings.policy)?;
    let value = json!({
        "action": decision.action,
        "current": decision.current,
        "target": decision.target,
        "reason": decision.reason.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_catalog(catalog: &TierCatalog) {
    for generation in catalog.generations() {
        let labels: Vec<String> = catalog
            .tiers(generation)
            .unwrap_or_default()
            .iter()
            .map(|t| t.label())
            .collect();
        println!("gen{generation}: {}", labels.join(" "));
    }
}

fn history(settings: &Settings, limit: usize) -> anyhow::Result<()> {
    let Some(path) = &settings.journal_path else {
        bail!("no journal configured; set [journal].path or --journal");
    };
    let journal = Journal::open(path)?;
    for entry in journal.recent(limit)? {
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_sends_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        shutdown_on(async { Ok(()) }, tx).await;
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn failed_signal_handler_keeps_running() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(shutdown_on(
            async { Err(std::io::Error::other("no signal support")) },
            tx,
        ));

        let changed = tokio::time::timeout(Duration::from_millis(50), rx.changed()).await;
        assert!(changed.is_err(), "shutdown must not be signalled");
        assert!(!*rx.borrow());
        waiter.abort();
    }
}
