//! Bounded, concurrent per-kind entity cache.
//!
//! Each [`EntityCache`] wraps a `moka` cache: reads never block on the backing
//! store and the cache never performs I/O. Capacity and TTL come from
//! [`CacheConfig`]; evicted entries are simply re-read on the next miss.

use std::hash::Hash;
use std::time::Duration;

use moka::sync::Cache;

use super::note::Note;
use super::organizer::{NoteOrganizer, OrganizerKey};
use super::relation::{NoteRelation, NoteResource, NoteResourceKey, RelationKey};
use super::resource::Resource;
use super::setting::{SystemSetting, UserSetting, UserSettingKey};
use super::shortcut::Shortcut;
use super::tag::{Tag, TagKey};
use super::types::EntityKind;
use super::user::User;
use crate::config::CacheConfig;

/// Identifier → last-known record for one entity kind.
pub struct EntityCache<K, V> {
    kind: EntityKind,
    inner: Cache<K, V>,
}

impl<K, V> EntityCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(kind: EntityKind, capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            kind,
            inner: builder.build(),
        }
    }

    pub fn get(&self, id: &K) -> Option<V> {
        self.inner.get(id)
    }

    pub fn put(&self, id: K, record: V) {
        self.inner.insert(id, record);
    }

    pub fn invalidate(&self, id: &K) {
        self.inner.invalidate(id);
    }

    /// Drop every entry. Entries inserted before this call are never returned again.
    pub fn clear(&self) {
        self.inner.invalidate_all();
        tracing::trace!(kind = %self.kind, "entity cache cleared");
    }

    /// Entry count after applying pending evictions.
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cache per entity kind, shared by every caller of a [`Store`](super::Store).
pub struct Caches {
    pub users: EntityCache<i64, User>,
    pub notes: EntityCache<i64, Note>,
    pub resources: EntityCache<i64, Resource>,
    pub note_resources: EntityCache<NoteResourceKey, NoteResource>,
    pub relations: EntityCache<RelationKey, NoteRelation>,
    pub organizers: EntityCache<OrganizerKey, NoteOrganizer>,
    pub tags: EntityCache<TagKey, Tag>,
    pub shortcuts: EntityCache<i64, Shortcut>,
    pub user_settings: EntityCache<UserSettingKey, UserSetting>,
    pub system_settings: EntityCache<String, SystemSetting>,
}

impl Caches {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = config.capacity;
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        Self {
            users: EntityCache::new(EntityKind::User, capacity, ttl),
            notes: EntityCache::new(EntityKind::Note, capacity, ttl),
            resources: EntityCache::new(EntityKind::Resource, capacity, ttl),
            note_resources: EntityCache::new(EntityKind::NoteResource, capacity, ttl),
            relations: EntityCache::new(EntityKind::NoteRelation, capacity, ttl),
            organizers: EntityCache::new(EntityKind::NoteOrganizer, capacity, ttl),
            tags: EntityCache::new(EntityKind::Tag, capacity, ttl),
            shortcuts: EntityCache::new(EntityKind::Shortcut, capacity, ttl),
            user_settings: EntityCache::new(EntityKind::UserSetting, capacity, ttl),
            system_settings: EntityCache::new(EntityKind::SystemSetting, capacity, ttl),
        }
    }

    /// Empty every kind. Used after maintenance deletes rows behind the write path.
    pub fn clear_all(&self) {
        self.users.clear();
        self.notes.clear();
        self.resources.clear();
        self.note_resources.clear();
        self.relations.clear();
        self.organizers.clear();
        self.tags.clear();
        self.shortcuts.clear();
        self.user_settings.clear();
        self.system_settings.clear();
        tracing::debug!("all entity caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache() -> EntityCache<i64, String> {
        EntityCache::new(EntityKind::Note, 100, None)
    }

    #[test]
    fn put_get_invalidate() {
        let cache = cache();
        assert!(cache.get(&1).is_none());

        cache.put(1, "one".into());
        assert_eq!(cache.get(&1).as_deref(), Some("one"));

        cache.put(1, "uno".into());
        assert_eq!(cache.get(&1).as_deref(), Some("uno"));

        cache.invalidate(&1);
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn clear_hides_existing_entries() {
        let cache = cache();
        for i in 0..10 {
            cache.put(i, i.to_string());
        }
        cache.clear();
        assert!((0..10).all(|i| cache.get(&i).is_none()));
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_bounds_entry_count() {
        let cache: EntityCache<i64, String> = EntityCache::new(EntityKind::Note, 16, None);
        for i in 0..200 {
            cache.put(i, i.to_string());
        }
        assert!(cache.len() <= 16, "cache grew past capacity: {}", cache.len());
    }

    #[test]
    fn concurrent_access_is_safe() {
        let cache = Arc::new(cache());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = (t * 1000 + i) % 50;
                        cache.put(key, format!("{t}-{i}"));
                        let _ = cache.get(&key);
                        if i % 3 == 0 {
                            cache.invalidate(&key);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 50);
    }

    #[test]
    fn clear_all_empties_every_kind() {
        let caches = Caches::new(&CacheConfig::default());
        caches.notes.put(1, Note::new(1, "hello"));
        caches
            .system_settings
            .put("k".into(), SystemSetting::new("k", "{}"));

        caches.clear_all();

        assert!(caches.notes.get(&1).is_none());
        assert!(caches.system_settings.get(&"k".to_string()).is_none());
    }
}
