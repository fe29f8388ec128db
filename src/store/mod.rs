//! The store facade: one access point over SQLite and the entity caches.
//!
//! Reads go cache-first and fall back to SQLite, populating the cache on the way
//! out. Writes commit a transaction and then invalidate the cached entry before
//! returning. Both the read-through population and the write invalidation
//! happen while the connection lock is held, so a caller that writes and then
//! reads the same id always observes its own write.
//!
//! Deletes never cascade. Rows that reference a deleted note or user are left
//! for [`Store::vacuum`] to collect.

pub mod cache;
pub mod entity;
pub mod note;
pub mod organizer;
pub mod relation;
pub mod resource;
pub mod setting;
pub mod shortcut;
pub mod tag;
pub mod types;
pub mod user;
pub mod vacuum;

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, InterruptHandle};

use crate::config::CacheConfig;
use crate::error::{Result, StoreError};
use cache::Caches;
use entity::Entity;

pub use note::{Note, NoteFilter};
pub use organizer::{NoteOrganizer, NoteOrganizerFilter};
pub use relation::{NoteRelation, NoteRelationFilter, NoteResource, NoteResourceFilter};
pub use resource::{Resource, ResourceFilter};
pub use setting::{SystemSetting, SystemSettingFilter, UserSetting, UserSettingFilter};
pub use shortcut::{Shortcut, ShortcutFilter};
pub use tag::{Tag, TagFilter};
pub use types::{EntityKind, RelationType, RowStatus, Visibility};
pub use user::{User, UserFilter};
pub use vacuum::VacuumReport;

pub struct Store {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
    caches: Caches,
}

impl Store {
    /// Wrap an initialized connection (see [`crate::db::open_database`]).
    pub fn new(conn: Connection, cache_config: &CacheConfig) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: Mutex::new(conn),
            interrupt,
            caches: Caches::new(cache_config),
        }
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Abort whatever statement is currently running; it fails with [`StoreError::Cancelled`].
    pub fn interrupt(&self) {
        tracing::debug!("interrupting in-flight statement");
        self.interrupt.interrupt();
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {e}")))
    }

    /// Cache-first lookup. A missing row is `NotFound` and is not cached.
    pub fn find_by_id<T: Entity>(&self, id: &T::Id) -> Result<T> {
        let cache = T::cache(&self.caches);
        if let Some(hit) = cache.get(id) {
            tracing::trace!(kind = %T::KIND, ?id, "cache hit");
            return Ok(hit);
        }

        let conn = self.lock()?;
        match T::fetch(&conn, id)? {
            Some(record) => {
                cache.put(id.clone(), record.clone());
                Ok(record)
            }
            None => Err(StoreError::not_found(T::KIND, id)),
        }
    }

    /// Query SQLite directly; filtered results are never cached.
    pub fn list<T: Entity>(&self, filter: &T::Filter) -> Result<Vec<T>> {
        let conn = self.lock()?;
        Ok(T::query(&conn, filter)?)
    }

    /// Insert or update, returning the record as stored.
    pub fn upsert<T: Entity>(&self, record: &T) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = T::write(&tx, record)?;
        let stored = T::fetch(&tx, &id)?.ok_or_else(|| StoreError::not_found(T::KIND, &id))?;
        tx.commit()?;

        T::cache(&self.caches).invalidate(&id);
        tracing::debug!(kind = %T::KIND, ?id, "upserted");
        Ok(stored)
    }

    /// Remove one row. Dependents are left for the next vacuum pass.
    pub fn delete<T: Entity>(&self, id: &T::Id) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = T::remove(&tx, id)?;
        if removed == 0 {
            return Err(StoreError::not_found(T::KIND, id));
        }
        tx.commit()?;

        T::cache(&self.caches).invalidate(id);
        tracing::debug!(kind = %T::KIND, ?id, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::sync::Arc;

    fn store() -> Store {
        Store::new(db::open_memory_database().unwrap(), &CacheConfig::default())
    }

    #[test]
    fn find_populates_cache() {
        let store = store();
        let note = store.upsert(&Note::new(1, "cached")).unwrap();
        assert!(store.caches().notes.get(&note.id).is_none());

        store.find_by_id::<Note>(&note.id).unwrap();
        assert_eq!(store.caches().notes.get(&note.id), Some(note));
    }

    #[test]
    fn missing_row_is_not_found_and_not_cached() {
        let store = store();
        let err = store.find_by_id::<Note>(&404).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.caches().notes.get(&404).is_none());
    }

    #[test]
    fn upsert_invalidates_cached_entry() {
        let store = store();
        let mut note = store.upsert(&Note::new(1, "first")).unwrap();
        store.find_by_id::<Note>(&note.id).unwrap();

        note.content = "second".into();
        store.upsert(&note).unwrap();

        assert!(store.caches().notes.get(&note.id).is_none());
        assert_eq!(store.find_by_id::<Note>(&note.id).unwrap().content, "second");
    }

    #[test]
    fn delete_missing_row_is_not_found() {
        let store = store();
        let err = store.delete::<Tag>(&("rust".into(), 1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn system_setting_round_trip_through_cache() {
        let store = store();
        store
            .upsert(&SystemSetting::new("customized-profile", r#"{"name":"x"}"#))
            .unwrap();
        let name = "customized-profile".to_string();
        assert_eq!(store.find_by_id::<SystemSetting>(&name).unwrap().value, r#"{"name":"x"}"#);
        assert!(store.caches().system_settings.get(&name).is_some());
    }

    #[test]
    fn concurrent_writers_and_readers_observe_their_own_writes() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut note = store.upsert(&Note::new(t, "v0")).unwrap();
                    for i in 1..25 {
                        note.content = format!("v{i}");
                        store.upsert(&note).unwrap();
                        let read = store.find_by_id::<Note>(&note.id).unwrap();
                        assert_eq!(read.content, note.content);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
