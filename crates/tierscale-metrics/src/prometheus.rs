//! Prometheus text exposition format.
//!
//! Renders the journal for scraping by a Prometheus server or compatible
//! agent. Gauges describe the newest entry; counters come from the
//! journal's lifetime totals, so they only ever grow.

use std::fmt::Write;

use tierscale_core::Action;
use tierscale_state::{JournalEntry, JournalTotals};

use crate::gauges::DecisionGauges;

/// Render the newest entry and the lifetime totals into Prometheus text
/// format.
///
/// Without an entry only the gauge declarations are emitted.
pub fn render_prometheus(latest: Option<&JournalEntry>, totals: &JournalTotals) -> String {
    let mut out = String::new();
    let gauges = latest.map(DecisionGauges::from_entry);
    let tier = latest.map(|e| e.decision.current.label()).unwrap_or_default();

    let gauge_rows: [(&str, &str, Option<String>); 5] = [
        (
            "tierscale_data_points",
            "Rows behind the latest moving average.",
            gauges.as_ref().map(|g| g.data_points.to_string()),
        ),
        (
            "tierscale_avg_cpu_percent",
            "Latest instantaneous CPU percent.",
            gauges.as_ref().map(|g| format!("{:.2}", g.avg_cpu_percent)),
        ),
        (
            "tierscale_moving_avg_cpu_percent",
            "Latest moving-average CPU percent.",
            gauges.as_ref().map(|g| format!("{:.2}", g.moving_avg_cpu_percent)),
        ),
        (
            "tierscale_current_cores",
            "vCores of the tier the database reported.",
            gauges.as_ref().map(|g| g.current_cores.to_string()),
        ),
        (
            "tierscale_target_cores",
            "vCores of the tier the autoscaler requested.",
            gauges.as_ref().map(|g| g.target_cores.to_string()),
        ),
    ];

    for (name, help, value) in &gauge_rows {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} gauge");
        if let Some(value) = value {
            let _ = writeln!(out, "{name}{{tier=\"{tier}\"}} {value}");
        }
    }

    out.push_str("# HELP tierscale_decisions_total Evaluations by resulting action.\n");
    out.push_str("# TYPE tierscale_decisions_total counter\n");
    for action in [Action::ScaleUp, Action::ScaleDown, Action::Hold] {
        let count = totals.decisions(action);
        let _ = writeln!(out, "tierscale_decisions_total{{action=\"{action}\"}} {count}");
    }

    out.push_str("# HELP tierscale_apply_failures_total Tier changes the executor rejected.\n");
    out.push_str("# TYPE tierscale_apply_failures_total counter\n");
    let _ = writeln!(
        out,
        "tierscale_apply_failures_total{{}} {}",
        totals.apply_failures
    );

    out
}
