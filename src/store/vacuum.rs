//! Orphan removal and file compaction.
//!
//! [`Store::purge_orphans`] runs every cleanup step inside one transaction: either
//! all steps commit or none do. [`Store::compact`] runs SQLite `VACUUM`, which
//! cannot run inside a transaction, so it is a separate operation with its own
//! error. [`Store::vacuum`] chains the two.
//!
//! Steps run in a fixed order. Notes of deleted users go first so that every
//! later step sees them gone and a second pass finds nothing to do.
//!
//! Maintenance deletes rows behind the per-entity write path, so after a
//! successful commit every entity cache is cleared wholesale.

use rusqlite::{Connection, Transaction};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::Store;
use crate::error::{Result, StoreError};

struct Step {
    table: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        table: "note",
        sql: "DELETE FROM note WHERE creator_id NOT IN (SELECT id FROM user)",
    },
    Step {
        table: "resource",
        sql: "DELETE FROM resource \
              WHERE creator_id NOT IN (SELECT id FROM user) \
                 OR (note_id IS NOT NULL AND note_id NOT IN (SELECT id FROM note))",
    },
    Step {
        table: "shortcut",
        sql: "DELETE FROM shortcut WHERE creator_id NOT IN (SELECT id FROM user)",
    },
    Step {
        table: "user_setting",
        sql: "DELETE FROM user_setting WHERE user_id NOT IN (SELECT id FROM user)",
    },
    Step {
        table: "note_organizer",
        sql: "DELETE FROM note_organizer \
              WHERE note_id NOT IN (SELECT id FROM note) \
                 OR user_id NOT IN (SELECT id FROM user)",
    },
    Step {
        table: "note_resource",
        sql: "DELETE FROM note_resource \
              WHERE note_id NOT IN (SELECT id FROM note) \
                 OR resource_id NOT IN (SELECT id FROM resource)",
    },
    Step {
        table: "note_relation",
        sql: "DELETE FROM note_relation \
              WHERE note_id NOT IN (SELECT id FROM note) \
                 OR related_note_id NOT IN (SELECT id FROM note)",
    },
    Step {
        table: "tag",
        sql: "DELETE FROM tag WHERE creator_id NOT IN (SELECT id FROM user)",
    },
];

/// Rows removed by one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepCount {
    pub table: &'static str,
    pub deleted: usize,
}

/// Per-step outcome of a purge, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VacuumReport {
    pub steps: Vec<StepCount>,
}

impl VacuumReport {
    pub fn total(&self) -> usize {
        self.steps.iter().map(|s| s.deleted).sum()
    }

    /// Rows removed from `table`, or 0 if the step did not run.
    pub fn deleted(&self, table: &str) -> usize {
        self.steps
            .iter()
            .find(|s| s.table == table)
            .map(|s| s.deleted)
            .unwrap_or(0)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(())
}

fn run_steps(tx: &Transaction<'_>, cancel: &CancellationToken) -> Result<VacuumReport> {
    let mut report = VacuumReport::default();
    for step in STEPS {
        check_cancelled(cancel)?;
        let deleted = tx.execute(step.sql, [])?;
        tracing::debug!(table = step.table, deleted, "vacuum step");
        report.steps.push(StepCount {
            table: step.table,
            deleted,
        });
    }
    Ok(report)
}

/// Reclaim free pages. Fails inside a transaction or while statements are active.
fn compact(conn: &Connection) -> Result<()> {
    conn.execute_batch("VACUUM")?;
    Ok(())
}

impl Store {
    /// Delete every orphaned derived row in one transaction.
    ///
    /// Cancellation is checked before each step and before commit; a cancelled
    /// or failed pass rolls back with no rows removed.
    pub fn purge_orphans(&self, cancel: &CancellationToken) -> Result<VacuumReport> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let report = run_steps(&tx, cancel)?;
        check_cancelled(cancel)?;
        tx.commit()?;

        self.caches.clear_all();
        tracing::info!(deleted = report.total(), "orphaned rows purged");
        Ok(report)
    }

    /// Shrink the database file. Not atomic with any purge that preceded it.
    pub fn compact(&self) -> Result<()> {
        let conn = self.lock()?;
        compact(&conn)?;
        tracing::info!("database compacted");
        Ok(())
    }

    /// Purge orphans, then compact.
    ///
    /// A compaction failure does not undo the purge; it is reported as
    /// [`StoreError::PartialMaintenance`] carrying the committed report.
    pub fn vacuum(&self, cancel: &CancellationToken) -> Result<VacuumReport> {
        let report = self.purge_orphans(cancel)?;
        after_compaction(report, self.compact())
    }
}

fn after_compaction(report: VacuumReport, compacted: Result<()>) -> Result<VacuumReport> {
    match compacted {
        Ok(()) => Ok(report),
        Err(e) => {
            tracing::warn!(error = %e, deleted = report.total(), "compaction failed after purge");
            Err(StoreError::PartialMaintenance {
                report,
                source: Box::new(e),
            })
        }
    }
}
