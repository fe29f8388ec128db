use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{now_ts, Conditions, Entity};
use super::types::{EntityKind, RowStatus};

/// A saved note query owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    /// Row id; `0` until first stored.
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    /// Serialized query, opaque to the store.
    pub payload: String,
    pub row_status: RowStatus,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl Shortcut {
    pub fn new(creator_id: i64, title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: 0,
            creator_id,
            title: title.into(),
            payload: payload.into(),
            row_status: RowStatus::Normal,
            created_ts: 0,
            updated_ts: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutFilter {
    pub creator_id: Option<i64>,
}

const COLUMNS: &str = "id, creator_id, title, payload, row_status, created_ts, updated_ts";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Shortcut> {
    Ok(Shortcut {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        title: row.get(2)?,
        payload: row.get(3)?,
        row_status: row.get(4)?,
        created_ts: row.get(5)?,
        updated_ts: row.get(6)?,
    })
}

impl Entity for Shortcut {
    type Id = i64;
    type Filter = ShortcutFilter;

    const KIND: EntityKind = EntityKind::Shortcut;

    fn cache(caches: &Caches) -> &EntityCache<i64, Self> {
        &caches.shortcuts
    }

    fn fetch(conn: &Connection, id: &i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM shortcut WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &ShortcutFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(creator_id) = filter.creator_id {
            cond.eq("creator_id", creator_id);
        }
        let sql = format!("SELECT {COLUMNS} FROM shortcut {} ORDER BY id", cond.where_sql());
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, sc: &Self) -> rusqlite::Result<i64> {
        let now = now_ts();
        let created_ts = if sc.created_ts == 0 { now } else { sc.created_ts };

        if sc.id == 0 {
            tx.execute(
                "INSERT INTO shortcut (creator_id, title, payload, row_status, created_ts, updated_ts) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![sc.creator_id, sc.title, sc.payload, sc.row_status, created_ts, now],
            )?;
            return Ok(tx.last_insert_rowid());
        }

        tx.execute(
            "INSERT INTO shortcut (id, creator_id, title, payload, row_status, created_ts, updated_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
                title = excluded.title, \
                payload = excluded.payload, \
                row_status = excluded.row_status, \
                updated_ts = excluded.updated_ts",
            params![sc.id, sc.creator_id, sc.title, sc.payload, sc.row_status, created_ts, now],
        )?;
        Ok(sc.id)
    }

    fn remove(tx: &Transaction<'_>, id: &i64) -> rusqlite::Result<usize> {
        tx.execute("DELETE FROM shortcut WHERE id = ?1", params![id])
    }
}
