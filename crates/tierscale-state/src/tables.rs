//! redb table definitions for the decision journal.

use redb::TableDefinition;

/// Journal entries keyed by a monotonically increasing sequence number.
///
/// Values are JSON-serialized [`JournalEntry`](crate::JournalEntry) records.
pub const DECISIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("decisions");

/// Journal-wide counters that survive pruning: the next sequence number and
/// lifetime decision totals.
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub const NEXT_SEQ: &str = "next_seq";
pub const SCALE_UP_TOTAL: &str = "decisions.scale_up";
pub const SCALE_DOWN_TOTAL: &str = "decisions.scale_down";
pub const HOLD_TOTAL: &str = "decisions.hold";
pub const APPLY_FAILURES_TOTAL: &str = "apply_failures";
