//! SQL DDL for all jotter tables.
//!
//! One table per entity kind plus `schema_meta`. Tables declare no
//! foreign keys between each other: orphaned rows are collected by the vacuum
//! pass, not by cascades. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    nickname TEXT NOT NULL DEFAULT '',
    row_status TEXT NOT NULL DEFAULT 'NORMAL' CHECK(row_status IN ('NORMAL','ARCHIVED')),
    created_ts INTEGER NOT NULL,
    updated_ts INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS note (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id INTEGER NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    visibility TEXT NOT NULL DEFAULT 'PRIVATE' CHECK(visibility IN ('PRIVATE','PROTECTED','PUBLIC')),
    row_status TEXT NOT NULL DEFAULT 'NORMAL' CHECK(row_status IN ('NORMAL','ARCHIVED')),
    created_ts INTEGER NOT NULL,
    updated_ts INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_note_creator ON note(creator_id);
CREATE INDEX IF NOT EXISTS idx_note_created ON note(created_ts);

CREATE TABLE IF NOT EXISTS resource (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id INTEGER NOT NULL,
    note_id INTEGER,
    public_id TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL DEFAULT '',
    external_link TEXT NOT NULL DEFAULT '',
    size INTEGER NOT NULL DEFAULT 0,
    type TEXT NOT NULL DEFAULT '',
    created_ts INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resource_note ON resource(note_id);

CREATE TABLE IF NOT EXISTS note_relation (
    note_id INTEGER NOT NULL,
    related_note_id INTEGER NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('REFERENCE','ADDITIONAL')),
    UNIQUE(note_id, related_note_id, type)
);

CREATE TABLE IF NOT EXISTS note_organizer (
    note_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    pinned INTEGER NOT NULL DEFAULT 0 CHECK(pinned IN (0, 1)),
    UNIQUE(note_id, user_id)
);

CREATE TABLE IF NOT EXISTS tag (
    name TEXT NOT NULL,
    creator_id INTEGER NOT NULL,
    UNIQUE(name, creator_id)
);

CREATE TABLE IF NOT EXISTS shortcut (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id INTEGER NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    payload TEXT NOT NULL DEFAULT '',
    row_status TEXT NOT NULL DEFAULT 'NORMAL' CHECK(row_status IN ('NORMAL','ARCHIVED')),
    created_ts INTEGER NOT NULL,
    updated_ts INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_setting (
    user_id INTEGER NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE(user_id, key)
);

CREATE TABLE IF NOT EXISTS system_setting (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
