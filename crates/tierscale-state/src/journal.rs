//! Journal — redb-backed decision history.
//!
//! Supports on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, Table};
use tracing::debug;

use tierscale_core::Action;

use crate::error::{StateError, StateResult};
use crate::tables::{
    APPLY_FAILURES_TOTAL, COUNTERS, DECISIONS, HOLD_TOTAL, NEXT_SEQ, SCALE_DOWN_TOTAL,
    SCALE_UP_TOTAL,
};
use crate::types::{ApplyStatus, JournalEntry, JournalTotals};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe decision journal backed by redb.
#[derive(Clone)]
pub struct Journal {
    db: Arc<Database>,
}

impl Journal {
    /// Open (or create) a persistent journal at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let journal = Self { db: Arc::new(db) };
        journal.ensure_tables()?;
        debug!(?path, "journal opened");
        Ok(journal)
    }

    /// Create an ephemeral in-memory journal (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let journal = Self { db: Arc::new(db) };
        journal.ensure_tables()?;
        debug!("in-memory journal opened");
        Ok(journal)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(DECISIONS).map_err(map_err!(Table))?;
        txn.open_table(COUNTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Append an entry, assigning it the next sequence number.
    ///
    /// Sequence numbers are never reused, even after a prune empties the
    /// table.
    pub fn record(&self, mut entry: JournalEntry) -> StateResult<JournalEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DECISIONS).map_err(map_err!(Table))?;
            let mut counters = txn.open_table(COUNTERS).map_err(map_err!(Table))?;

            // Journals written before the counters table existed only have
            // the last key to go on.
            let after_last = match table.last().map_err(map_err!(Read))? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            entry.seq = read_counter(&counters, NEXT_SEQ)?.max(after_last);

            let value = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
            table
                .insert(entry.seq, value.as_slice())
                .map_err(map_err!(Write))?;

            counters
                .insert(NEXT_SEQ, entry.seq + 1)
                .map_err(map_err!(Write))?;
            let action_key = match entry.decision.action {
                Action::ScaleUp => SCALE_UP_TOTAL,
                Action::ScaleDown => SCALE_DOWN_TOTAL,
                Action::Hold => HOLD_TOTAL,
            };
            bump_counter(&mut counters, action_key)?;
            if matches!(entry.status, ApplyStatus::Failed { .. }) {
                bump_counter(&mut counters, APPLY_FAILURES_TOTAL)?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            seq = entry.seq,
            action = %entry.decision.action,
            to = %entry.decision.target,
            "decision recorded"
        );
        Ok(entry)
    }

    /// Lifetime decision totals, unaffected by pruning.
    pub fn totals(&self) -> StateResult<JournalTotals> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let counters = txn.open_table(COUNTERS).map_err(map_err!(Table))?;
        Ok(JournalTotals {
            scale_up: read_counter(&counters, SCALE_UP_TOTAL)?,
            scale_down: read_counter(&counters, SCALE_DOWN_TOTAL)?,
            hold: read_counter(&counters, HOLD_TOTAL)?,
            apply_failures: read_counter(&counters, APPLY_FAILURES_TOTAL)?,
        })
    }

    /// Get an entry by sequence number.
    pub fn get(&self, seq: u64) -> StateResult<Option<JournalEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DECISIONS).map_err(map_err!(Table))?;
        match table.get(seq).map_err(map_err!(Read))? {
            Some(guard) => {
                let entry: JournalEntry =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> StateResult<Vec<JournalEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DECISIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))?.rev().take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: JournalEntry =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// The newest entry, if any.
    pub fn latest(&self) -> StateResult<Option<JournalEntry>> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Drop all but the newest `keep` entries. Returns the number removed.
    pub fn prune(&self, keep: usize) -> StateResult<usize> {
        let stale: Vec<u64> = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(DECISIONS).map_err(map_err!(Table))?;
            let mut keys = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))?.rev().skip(keep) {
                let (key, _) = entry.map_err(map_err!(Read))?;
                keys.push(key.value());
            }
            keys
        };

        if stale.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DECISIONS).map_err(map_err!(Table))?;
            for seq in &stale {
                table.remove(*seq).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(removed = stale.len(), keep, "journal pruned");
        Ok(stale.len())
    }
}

fn read_counter(table: &impl ReadableTable<&'static str, u64>, key: &str) -> StateResult<u64> {
    Ok(table
        .get(key)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(0))
}

fn bump_counter(table: &mut Table<'_, &'static str, u64>, key: &str) -> StateResult<()> {
    let next = read_counter(&*table, key)? + 1;
    table.insert(key, next).map_err(map_err!(Write))?;
    Ok(())
}
