//! Derived records linking notes to notes and notes to resources.
//!
//! Neither table carries foreign keys: deleting a note leaves these rows behind
//! until the next vacuum pass removes them.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{now_ts, Conditions, Entity};
use super::types::{EntityKind, RelationType};

/// `(note_id, related_note_id, relation_type)`
pub type RelationKey = (i64, i64, RelationType);

/// A directed link from `note_id` to `related_note_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRelation {
    pub note_id: i64,
    pub related_note_id: i64,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl NoteRelation {
    pub fn new(note_id: i64, related_note_id: i64, relation_type: RelationType) -> Self {
        Self {
            note_id,
            related_note_id,
            relation_type,
        }
    }

    pub fn key(&self) -> RelationKey {
        (self.note_id, self.related_note_id, self.relation_type)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteRelationFilter {
    pub note_id: Option<i64>,
    pub related_note_id: Option<i64>,
    pub relation_type: Option<RelationType>,
}

fn relation_from_row(row: &Row<'_>) -> rusqlite::Result<NoteRelation> {
    Ok(NoteRelation {
        note_id: row.get(0)?,
        related_note_id: row.get(1)?,
        relation_type: row.get(2)?,
    })
}

impl Entity for NoteRelation {
    type Id = RelationKey;
    type Filter = NoteRelationFilter;

    const KIND: EntityKind = EntityKind::NoteRelation;

    fn cache(caches: &Caches) -> &EntityCache<RelationKey, Self> {
        &caches.relations
    }

    fn fetch(conn: &Connection, id: &RelationKey) -> rusqlite::Result<Option<Self>> {
        let (note_id, related_note_id, relation_type) = id;
        conn.query_row(
            "SELECT note_id, related_note_id, type FROM note_relation \
             WHERE note_id = ?1 AND related_note_id = ?2 AND type = ?3",
            params![note_id, related_note_id, relation_type],
            relation_from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &NoteRelationFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(note_id) = filter.note_id {
            cond.eq("note_id", note_id);
        }
        if let Some(related) = filter.related_note_id {
            cond.eq("related_note_id", related);
        }
        if let Some(t) = filter.relation_type {
            cond.eq("type", t.as_str().to_string());
        }
        let sql = format!(
            "SELECT note_id, related_note_id, type FROM note_relation {} \
             ORDER BY note_id, related_note_id, type",
            cond.where_sql()
        );
        cond.collect(conn, &sql, relation_from_row)
    }

    fn write(tx: &Transaction<'_>, rel: &Self) -> rusqlite::Result<RelationKey> {
        tx.execute(
            "INSERT INTO note_relation (note_id, related_note_id, type) VALUES (?1, ?2, ?3) \
             ON CONFLICT(note_id, related_note_id, type) DO NOTHING",
            params![rel.note_id, rel.related_note_id, rel.relation_type],
        )?;
        Ok(rel.key())
    }

    fn remove(tx: &Transaction<'_>, id: &RelationKey) -> rusqlite::Result<usize> {
        let (note_id, related_note_id, relation_type) = id;
        tx.execute(
            "DELETE FROM note_relation WHERE note_id = ?1 AND related_note_id = ?2 AND type = ?3",
            params![note_id, related_note_id, relation_type],
        )
    }
}

/// `(note_id, resource_id)`
pub type NoteResourceKey = (i64, i64);

/// A resource linked into a note other than (or in addition to) its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteResource {
    pub note_id: i64,
    pub resource_id: i64,
    pub created_ts: i64,
}

impl NoteResource {
    pub fn new(note_id: i64, resource_id: i64) -> Self {
        Self {
            note_id,
            resource_id,
            created_ts: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteResourceFilter {
    pub note_id: Option<i64>,
    pub resource_id: Option<i64>,
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<NoteResource> {
    Ok(NoteResource {
        note_id: row.get(0)?,
        resource_id: row.get(1)?,
        created_ts: row.get(2)?,
    })
}

impl Entity for NoteResource {
    type Id = NoteResourceKey;
    type Filter = NoteResourceFilter;

    const KIND: EntityKind = EntityKind::NoteResource;

    fn cache(caches: &Caches) -> &EntityCache<NoteResourceKey, Self> {
        &caches.note_resources
    }

    fn fetch(conn: &Connection, id: &NoteResourceKey) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT note_id, resource_id, created_ts FROM note_resource \
             WHERE note_id = ?1 AND resource_id = ?2",
            params![id.0, id.1],
            link_from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &NoteResourceFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(note_id) = filter.note_id {
            cond.eq("note_id", note_id);
        }
        if let Some(resource_id) = filter.resource_id {
            cond.eq("resource_id", resource_id);
        }
        let sql = format!(
            "SELECT note_id, resource_id, created_ts FROM note_resource {} \
             ORDER BY created_ts, note_id, resource_id",
            cond.where_sql()
        );
        cond.collect(conn, &sql, link_from_row)
    }

    fn write(tx: &Transaction<'_>, link: &Self) -> rusqlite::Result<NoteResourceKey> {
        let created_ts = if link.created_ts == 0 { now_ts() } else { link.created_ts };
        tx.execute(
            "INSERT INTO note_resource (note_id, resource_id, created_ts) VALUES (?1, ?2, ?3) \
             ON CONFLICT(note_id, resource_id) DO UPDATE SET created_ts = excluded.created_ts",
            params![link.note_id, link.resource_id, created_ts],
        )?;
        Ok((link.note_id, link.resource_id))
    }

    fn remove(tx: &Transaction<'_>, id: &NoteResourceKey) -> rusqlite::Result<usize> {
        tx.execute(
            "DELETE FROM note_resource WHERE note_id = ?1 AND resource_id = ?2",
            params![id.0, id.1],
        )
    }
}
