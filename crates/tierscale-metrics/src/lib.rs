//! tierscale-metrics — observability for autoscaler decisions.
//!
//! Derives per-evaluation gauges (data points, CPU averages, current and
//! target cores), emits them as structured tracing events, and renders
//! journal entries in Prometheus text format.
//!
//! ```text
//! Controller::tick()
//!   └── DecisionGauges::from_entry() → emit()   ← one event per evaluation
//!
//! Prometheus exposition
//!   └── render_prometheus(latest, totals) → text/plain for /metrics
//! ```

pub mod gauges;
pub mod prometheus;

pub use gauges::DecisionGauges;
pub use prometheus::render_prometheus;
