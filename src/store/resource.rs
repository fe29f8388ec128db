//! Attachments. A resource exists on its own and may name an owning note.

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{now_ts, Conditions, Entity};
use super::types::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Row id; `0` until first stored.
    pub id: i64,
    pub creator_id: i64,
    pub note_id: Option<i64>,
    /// Unguessable id used in public URLs. Generated on insert when empty.
    pub public_id: String,
    pub filename: String,
    /// When set, the bytes live elsewhere and this URL is served as-is.
    pub external_link: String,
    pub size: i64,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub created_ts: i64,
}

impl Resource {
    pub fn new(creator_id: i64, filename: impl Into<String>) -> Self {
        Self {
            id: 0,
            creator_id,
            note_id: None,
            public_id: String::new(),
            filename: filename.into(),
            external_link: String::new(),
            size: 0,
            mime_type: String::new(),
            created_ts: 0,
        }
    }

    pub fn attached_to(mut self, note_id: i64) -> Self {
        self.note_id = Some(note_id);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub creator_id: Option<i64>,
    pub note_id: Option<i64>,
    pub public_id: Option<String>,
}

impl ResourceFilter {
    /// Resources owned by `note_id` plus those linked to it through `note_resource`.
    pub fn for_note(note_id: i64) -> Self {
        Self {
            note_id: Some(note_id),
            ..Self::default()
        }
    }
}

const COLUMNS: &str =
    "id, creator_id, note_id, public_id, filename, external_link, size, type, created_ts";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        note_id: row.get(2)?,
        public_id: row.get(3)?,
        filename: row.get(4)?,
        external_link: row.get(5)?,
        size: row.get(6)?,
        mime_type: row.get(7)?,
        created_ts: row.get(8)?,
    })
}

impl Entity for Resource {
    type Id = i64;
    type Filter = ResourceFilter;

    const KIND: EntityKind = EntityKind::Resource;

    fn cache(caches: &Caches) -> &EntityCache<i64, Self> {
        &caches.resources
    }

    fn fetch(conn: &Connection, id: &i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM resource WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    }

    /// Insertion order, so "first attachment" is the one uploaded first. With a
    /// note filter, resources the note owns come before linked ones.
    fn query(conn: &Connection, filter: &ResourceFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(creator_id) = filter.creator_id {
            cond.eq("creator_id", creator_id);
        }
        if let Some(note_id) = filter.note_id {
            cond.clause(
                "note_id = ? OR id IN (SELECT resource_id FROM note_resource WHERE note_id = ?)",
                [Value::from(note_id), Value::from(note_id)],
            );
        }
        if let Some(ref public_id) = filter.public_id {
            cond.eq("public_id", public_id.clone());
        }
        let owned_first = filter
            .note_id
            .map(|id| format!("note_id IS NOT {id}, "))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {COLUMNS} FROM resource {} ORDER BY {owned_first}created_ts, id",
            cond.where_sql()
        );
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, res: &Self) -> rusqlite::Result<i64> {
        let created_ts = if res.created_ts == 0 { now_ts() } else { res.created_ts };
        let public_id = if res.public_id.is_empty() {
            uuid::Uuid::now_v7().to_string()
        } else {
            res.public_id.clone()
        };

        if res.id == 0 {
            tx.execute(
                "INSERT INTO resource (creator_id, note_id, public_id, filename, external_link, size, type, created_ts) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    res.creator_id,
                    res.note_id,
                    public_id,
                    res.filename,
                    res.external_link,
                    res.size,
                    res.mime_type,
                    created_ts,
                ],
            )?;
            return Ok(tx.last_insert_rowid());
        }

        tx.execute(
            "INSERT INTO resource (id, creator_id, note_id, public_id, filename, external_link, size, type, created_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                note_id = excluded.note_id, \
                filename = excluded.filename, \
                external_link = excluded.external_link, \
                size = excluded.size, \
                type = excluded.type",
            params![
                res.id,
                res.creator_id,
                res.note_id,
                public_id,
                res.filename,
                res.external_link,
                res.size,
                res.mime_type,
                created_ts,
            ],
        )?;
        Ok(res.id)
    }

    fn remove(tx: &Transaction<'_>, id: &i64) -> rusqlite::Result<usize> {
        tx.execute("DELETE FROM resource WHERE id = ?1", params![id])
    }
}
