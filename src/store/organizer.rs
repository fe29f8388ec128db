use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{Conditions, Entity};
use super::types::EntityKind;

/// `(note_id, user_id)`
pub type OrganizerKey = (i64, i64);

/// Per-user arrangement of a note (currently: pinned or not).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteOrganizer {
    pub note_id: i64,
    pub user_id: i64,
    pub pinned: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NoteOrganizerFilter {
    pub note_id: Option<i64>,
    pub user_id: Option<i64>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<NoteOrganizer> {
    Ok(NoteOrganizer {
        note_id: row.get(0)?,
        user_id: row.get(1)?,
        pinned: row.get(2)?,
    })
}

impl Entity for NoteOrganizer {
    type Id = OrganizerKey;
    type Filter = NoteOrganizerFilter;

    const KIND: EntityKind = EntityKind::NoteOrganizer;

    fn cache(caches: &Caches) -> &EntityCache<OrganizerKey, Self> {
        &caches.organizers
    }

    fn fetch(conn: &Connection, id: &OrganizerKey) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT note_id, user_id, pinned FROM note_organizer WHERE note_id = ?1 AND user_id = ?2",
            params![id.0, id.1],
            from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &NoteOrganizerFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(note_id) = filter.note_id {
            cond.eq("note_id", note_id);
        }
        if let Some(user_id) = filter.user_id {
            cond.eq("user_id", user_id);
        }
        let sql = format!(
            "SELECT note_id, user_id, pinned FROM note_organizer {} ORDER BY note_id, user_id",
            cond.where_sql()
        );
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, org: &Self) -> rusqlite::Result<OrganizerKey> {
        tx.execute(
            "INSERT INTO note_organizer (note_id, user_id, pinned) VALUES (?1, ?2, ?3) \
             ON CONFLICT(note_id, user_id) DO UPDATE SET pinned = excluded.pinned",
            params![org.note_id, org.user_id, org.pinned],
        )?;
        Ok((org.note_id, org.user_id))
    }

    fn remove(tx: &Transaction<'_>, id: &OrganizerKey) -> rusqlite::Result<usize> {
        tx.execute(
            "DELETE FROM note_organizer WHERE note_id = ?1 AND user_id = ?2",
            params![id.0, id.1],
        )
    }
}
