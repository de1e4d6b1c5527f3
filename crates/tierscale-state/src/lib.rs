//! tierscale-state — persistent journal of autoscaler decisions.
//!
//! Every evaluated sample is recorded together with the decision it
//! produced and whether the requested tier change was applied. This is the
//! audit trail behind the `history` command and the `/metrics` endpoint.
//!
//! # Architecture
//!
//! Backed by [redb](https://docs.rs/redb). Entries are JSON-serialized into
//! a `u64 → &[u8]` table keyed by sequence number, so iteration order is
//! recording order. A second `&str → u64` counters table keeps the next
//! sequence number and lifetime decision totals, so neither goes backwards
//! when old entries are pruned. The `Journal` is `Clone + Send + Sync` (backed by
//! `Arc<Database>`) and can be shared between the controller loop and the
//! HTTP API.

pub mod error;
pub mod journal;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use journal::Journal;
pub use types::*;
