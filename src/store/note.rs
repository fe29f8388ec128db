//! Notes: the primary record. Everything else in the store hangs off a note or a user.

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{now_ts, page_sql, Conditions, Entity};
use super::types::{EntityKind, RowStatus, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Row id; `0` until the note is first stored.
    pub id: i64,
    pub creator_id: i64,
    pub content: String,
    pub visibility: Visibility,
    pub row_status: RowStatus,
    /// Unix seconds. `0` on insert means "now".
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl Note {
    /// A new private, normal note for `creator_id`.
    pub fn new(creator_id: i64, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            creator_id,
            content: content.into(),
            visibility: Visibility::Private,
            row_status: RowStatus::Normal,
            created_ts: 0,
            updated_ts: 0,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_row_status(mut self, row_status: RowStatus) -> Self {
        self.row_status = row_status;
        self
    }

    pub fn with_created_ts(mut self, created_ts: i64) -> Self {
        self.created_ts = created_ts;
        self
    }

    /// Whether the note may appear on a public surface.
    pub fn is_publicly_listed(&self) -> bool {
        self.visibility == Visibility::Public && self.row_status == RowStatus::Normal
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub creator_id: Option<i64>,
    pub row_status: Option<RowStatus>,
    /// Empty means any visibility.
    pub visibilities: Vec<Visibility>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl NoteFilter {
    /// Normal, public notes, optionally for a single author.
    pub fn public(creator_id: Option<i64>) -> Self {
        Self {
            creator_id,
            row_status: Some(RowStatus::Normal),
            visibilities: vec![Visibility::Public],
            ..Self::default()
        }
    }
}

const COLUMNS: &str = "id, creator_id, content, visibility, row_status, created_ts, updated_ts";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        content: row.get(2)?,
        visibility: row.get(3)?,
        row_status: row.get(4)?,
        created_ts: row.get(5)?,
        updated_ts: row.get(6)?,
    })
}

impl Entity for Note {
    type Id = i64;
    type Filter = NoteFilter;

    const KIND: EntityKind = EntityKind::Note;

    fn cache(caches: &Caches) -> &EntityCache<i64, Self> {
        &caches.notes
    }

    fn fetch(conn: &Connection, id: &i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM note WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    }

    /// Newest first; ties broken by id so paging is stable.
    fn query(conn: &Connection, filter: &NoteFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(creator_id) = filter.creator_id {
            cond.eq("creator_id", creator_id);
        }
        if let Some(status) = filter.row_status {
            cond.eq("row_status", status.as_str().to_string());
        }
        cond.any_of(
            "visibility",
            filter
                .visibilities
                .iter()
                .map(|v| Value::from(v.as_str().to_string())),
        );
        let sql = format!(
            "SELECT {COLUMNS} FROM note {} ORDER BY created_ts DESC, id DESC {}",
            cond.where_sql(),
            page_sql(filter.limit, filter.offset),
        );
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, note: &Self) -> rusqlite::Result<i64> {
        let now = now_ts();
        let created_ts = if note.created_ts == 0 { now } else { note.created_ts };

        if note.id == 0 {
            tx.execute(
                "INSERT INTO note (creator_id, content, visibility, row_status, created_ts, updated_ts) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![note.creator_id, note.content, note.visibility, note.row_status, created_ts, now],
            )?;
            return Ok(tx.last_insert_rowid());
        }

        tx.execute(
            "INSERT INTO note (id, creator_id, content, visibility, row_status, created_ts, updated_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
                content = excluded.content, \
                visibility = excluded.visibility, \
                row_status = excluded.row_status, \
                updated_ts = excluded.updated_ts",
            params![note.id, note.creator_id, note.content, note.visibility, note.row_status, created_ts, now],
        )?;
        Ok(note.id)
    }

    fn remove(tx: &Transaction<'_>, id: &i64) -> rusqlite::Result<usize> {
        tx.execute("DELETE FROM note WHERE id = ?1", params![id])
    }
}
