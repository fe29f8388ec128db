//! Key/value settings: per-user and system-wide.
//!
//! Values are JSON text; the store does not interpret them.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};

use super::cache::{Caches, EntityCache};
use super::entity::{Conditions, Entity};
use super::types::EntityKind;

/// `(user_id, key)`
pub type UserSettingKey = (i64, String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetting {
    pub user_id: i64,
    pub key: String,
    pub value: String,
}

impl UserSetting {
    pub fn new(user_id: i64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            user_id,
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserSettingFilter {
    pub user_id: Option<i64>,
    pub key: Option<String>,
}

fn user_setting_from_row(row: &Row<'_>) -> rusqlite::Result<UserSetting> {
    Ok(UserSetting {
        user_id: row.get(0)?,
        key: row.get(1)?,
        value: row.get(2)?,
    })
}

impl Entity for UserSetting {
    type Id = UserSettingKey;
    type Filter = UserSettingFilter;

    const KIND: EntityKind = EntityKind::UserSetting;

    fn cache(caches: &Caches) -> &EntityCache<UserSettingKey, Self> {
        &caches.user_settings
    }

    fn fetch(conn: &Connection, id: &UserSettingKey) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT user_id, key, value FROM user_setting WHERE user_id = ?1 AND key = ?2",
            params![id.0, id.1],
            user_setting_from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &UserSettingFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(user_id) = filter.user_id {
            cond.eq("user_id", user_id);
        }
        if let Some(ref key) = filter.key {
            cond.eq("key", key.clone());
        }
        let sql = format!(
            "SELECT user_id, key, value FROM user_setting {} ORDER BY user_id, key",
            cond.where_sql()
        );
        cond.collect(conn, &sql, user_setting_from_row)
    }

    fn write(tx: &Transaction<'_>, setting: &Self) -> rusqlite::Result<UserSettingKey> {
        tx.execute(
            "INSERT INTO user_setting (user_id, key, value) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value",
            params![setting.user_id, setting.key, setting.value],
        )?;
        Ok((setting.user_id, setting.key.clone()))
    }

    fn remove(tx: &Transaction<'_>, id: &UserSettingKey) -> rusqlite::Result<usize> {
        tx.execute(
            "DELETE FROM user_setting WHERE user_id = ?1 AND key = ?2",
            params![id.0, id.1],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub name: String,
    pub value: String,
    pub description: String,
}

impl SystemSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemSettingFilter {
    pub name: Option<String>,
}

fn system_setting_from_row(row: &Row<'_>) -> rusqlite::Result<SystemSetting> {
    Ok(SystemSetting {
        name: row.get(0)?,
        value: row.get(1)?,
        description: row.get(2)?,
    })
}

impl Entity for SystemSetting {
    type Id = String;
    type Filter = SystemSettingFilter;

    const KIND: EntityKind = EntityKind::SystemSetting;

    fn cache(caches: &Caches) -> &EntityCache<String, Self> {
        &caches.system_settings
    }

    fn fetch(conn: &Connection, id: &String) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            "SELECT name, value, description FROM system_setting WHERE name = ?1",
            params![id],
            system_setting_from_row,
        )
        .optional()
    }

    fn query(conn: &Connection, filter: &SystemSettingFilter) -> rusqlite::Result<Vec<Self>> {
        let mut cond = Conditions::default();
        if let Some(ref name) = filter.name {
            cond.eq("name", name.clone());
        }
        let sql = format!(
            "SELECT name, value, description FROM system_setting {} ORDER BY name",
            cond.where_sql()
        );
        cond.collect(conn, &sql, system_setting_from_row)
    }

    fn write(tx: &Transaction<'_>, setting: &Self) -> rusqlite::Result<String> {
        tx.execute(
            "INSERT INTO system_setting (name, value, description) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, description = excluded.description",
            params![setting.name, setting.value, setting.description],
        )?;
        Ok(setting.name.clone())
    }

    fn remove(tx: &Transaction<'_>, id: &String) -> rusqlite::Result<usize> {
        tx.execute("DELETE FROM system_setting WHERE name = ?1", params![id])
    }
}
