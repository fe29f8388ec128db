//! Error taxonomy shared by the store, the vacuum pass, and the feed.
//!
//! [`StoreError::NotFound`] is an expected outcome, not a failure; callers map it
//! to a 404-equivalent. Storage failures are wrapped, never swallowed.

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::store::types::EntityKind;
use crate::store::vacuum::VacuumReport;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The backing store rejected a statement or a transaction failed.
    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation cancelled")]
    Cancelled,

    /// Orphan removal committed, but the follow-up compaction did not run.
    #[error("orphans removed but compaction failed: {source}")]
    PartialMaintenance {
        report: VacuumReport,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub(crate) fn not_found(kind: EntityKind, id: &impl std::fmt::Debug) -> Self {
        Self::NotFound {
            kind,
            id: format!("{id:?}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == ErrorCode::OperationInterrupted =>
            {
                Self::Cancelled
            }
            other => Self::Storage(other),
        }
    }
}
