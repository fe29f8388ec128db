use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{now_ts, Conditions, Entity};
use super::types::{EntityKind, RowStatus};

/// An account. Notes, resources, shortcuts, tags and settings are owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id; `0` until first stored.
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub row_status: RowStatus,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            nickname: String::new(),
            row_status: RowStatus::Normal,
            created_ts: 0,
            updated_ts: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub row_status: Option<RowStatus>,
}

const COLUMNS: &str = "id, username, nickname, row_status, created_ts, updated_ts";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        nickname: row.get(2)?,
        row_status: row.get(3)?,
        created_ts: row.get(4)?,
        updated_ts: row.get(5)?,
    })
}

impl Entity for User {
    type Id = i64;
    type Filter = UserFilter;

    const KIND: EntityKind = EntityKind::User;

    fn cache(caches: &Caches) -> &EntityCache<i64, Self> {
        &caches.users
    }

    fn fetch(conn: &Connection, id: &i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM user WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &UserFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(ref username) = filter.username {
            cond.eq("username", username.clone());
        }
        if let Some(status) = filter.row_status {
            cond.eq("row_status", status.as_str().to_string());
        }
        let sql = format!("SELECT {COLUMNS} FROM user {} ORDER BY id", cond.where_sql());
        cond.collect(conn, &sql, from_row)
    }

    fn write(tx: &Transaction<'_>, user: &Self) -> rusqlite::Result<i64> {
        let now = now_ts();
        let created_ts = if user.created_ts == 0 { now } else { user.created_ts };

        if user.id == 0 {
            tx.execute(
                "INSERT INTO user (username, nickname, row_status, created_ts, updated_ts) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.username, user.nickname, user.row_status, created_ts, now],
            )?;
            return Ok(tx.last_insert_rowid());
        }

        tx.execute(
            "INSERT INTO user (id, username, nickname, row_status, created_ts, updated_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(id) DO UPDATE SET \
                username = excluded.username, \
                nickname = excluded.nickname, \
                row_status = excluded.row_status, \
                updated_ts = excluded.updated_ts",
            params![user.id, user.username, user.nickname, user.row_status, created_ts, now],
        )?;
        Ok(user.id)
    }

    fn remove(tx: &Transaction<'_>, id: &i64) -> rusqlite::Result<usize> {
        tx.execute("DELETE FROM user WHERE id = ?1", params![id])
    }
}
