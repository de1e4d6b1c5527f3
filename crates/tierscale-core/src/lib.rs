//! tierscale-core — tier model, catalog, samples, policy, and decisions.
//!
//! Everything in this crate is pure data plus parsing and lookup. The
//! decision engine in `tierscale-autoscale` builds on these types.

pub mod catalog;
pub mod config;
pub mod decision;
pub mod error;
pub mod policy;
pub mod sample;
pub mod tier;

pub use catalog::{Direction, TierCatalog};
pub use config::TierscaleConfig;
pub use decision::{Action, Decision, Reason};
pub use error::{PolicyError, TierError, TierResult};
pub use policy::ScalingPolicy;
pub use sample::UtilizationSample;
pub use tier::Tier;
