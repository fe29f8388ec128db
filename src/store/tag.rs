use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{Conditions, Entity};
use super::types::EntityKind;

/// `(name, creator_id)`
pub type TagKey = (String, i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub creator_id: i64,
}

impl Tag {
    pub fn new(name: impl Into<String>, creator_id: i64) -> Self {
        Self {
            name: name.into(),
            creator_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub creator_id: Option<i64>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        name: row.get(0)?,
        creator_id: row.get(1)?,
    })
}

impl Entity for Tag {
    type Id = TagKey;
    type Filter = TagFilter;

    const KIND: EntityKind = EntityKind::Tag;

    fn cache(caches: &Caches) -> &EntityCache<TagKey, Self> {
        &caches.tags
    }

    fn fetch(conn: &Connection, id: &TagKey) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT name, creator_id FROM tag WHERE name = ?1 AND creator_id = ?2",
            params![id.0, id.1],
            from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &TagFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(creator_id) = filter.creator_id {
            cond.eq("creator_id", creator_id);
        }
        let sql = format!(
            "SELECT name, creator_id FROM tag {} ORDER BY name, creator_id",
            cond.where_sql()
        );
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, tag: &Self) -> rusqlite::Result<TagKey> {
        tx.execute(
            "INSERT INTO tag (name, creator_id) VALUES (?1, ?2) \
             ON CONFLICT(name, creator_id) DO NOTHING",
            params![tag.name, tag.creator_id],
        )?;
        Ok((tag.name.clone(), tag.creator_id))
    }

    fn remove(tx: &Transaction<'_>, id: &TagKey) -> rusqlite::Result<usize> {
        tx.execute(
            "DELETE FROM tag WHERE name = ?1 AND creator_id = ?2",
            params![id.0, id.1],
        )
    }
}
