//! tierscale-autoscale — threshold-driven compute tier stepping.
//!
//! The [`DecisionEngine`] compares a sample's moving-average CPU against the
//! policy thresholds and recommends moving one catalog step up or down, or
//! holding. The [`Controller`] wraps it in a periodic loop with pluggable
//! metric sources and executors.
//!
//! # Decision algorithm
//!
//! ```text
//! if data_points < required_data_points:
//!     Hold("insufficient data points")
//!
//! if moving_avg > high_threshold:
//!     next = catalog.neighbor_of(current, Next)
//!     if next exists and current.cores < max_cores: ScaleUp(next)
//!
//! if moving_avg < low_threshold:
//!     prev = catalog.neighbor_of(current, Previous)
//!     if prev exists and current.cores > min_cores: ScaleDown(prev)
//!
//! otherwise Hold("within band")
//! ```
//!
//! Both thresholds are evaluated every cycle; scale-up takes precedence if a
//! malformed policy lets both fire.

pub mod controller;
pub mod engine;
pub mod executor;
pub mod source;
pub mod window;

pub use controller::{Controller, Outcome};
pub use engine::DecisionEngine;
pub use executor::{CommandExecutor, DryRunExecutor, TierExecutor};
pub use source::{BoxFuture, JsonLinesSource, MetricSource, StaticSource};
pub use window::{ResourceStatRow, summarize};
