#![allow(dead_code)]

use jotter::config::CacheConfig;
use jotter::db;
use jotter::store::{Note, Store, User, Visibility};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// A store over a fresh in-memory database with the default cache.
pub fn test_store() -> Store {
    Store::new(test_db(), &CacheConfig::default())
}

/// Insert a user and return its id.
pub fn insert_user(store: &Store, username: &str) -> i64 {
    store.upsert(&User::new(username)).unwrap().id
}

/// Insert a private note and return it as stored.
pub fn insert_note(store: &Store, creator_id: i64, content: &str) -> Note {
    store.upsert(&Note::new(creator_id, content)).unwrap()
}

/// Insert a public note with a fixed creation time and return it as stored.
pub fn insert_public_note(store: &Store, creator_id: i64, content: &str, created_ts: i64) -> Note {
    store
        .upsert(
            &Note::new(creator_id, content)
                .with_visibility(Visibility::Public)
                .with_created_ts(created_ts),
        )
        .unwrap()
}
