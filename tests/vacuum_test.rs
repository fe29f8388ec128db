mod helpers;

use helpers::{insert_note, insert_user, test_db, test_store};
use jotter::config::CacheConfig;
use jotter::error::StoreError;
use jotter::store::{
    Note, NoteFilter, NoteOrganizer, NoteOrganizerFilter, NoteRelation, NoteRelationFilter,
    NoteResource, NoteResourceFilter, RelationType, Resource, ResourceFilter, Shortcut,
    ShortcutFilter, Store, Tag, TagFilter, User, UserSetting, UserSettingFilter,
};
use tokio_util::sync::CancellationToken;

/// Ids of a dataset where `bob` and one of alice's notes have been deleted.
struct Seeded {
    alice: i64,
    bob: i64,
    live_note: i64,
    bob_note: i64,
    live_resource: i64,
}

fn organizer(note_id: i64, user_id: i64) -> NoteOrganizer {
    NoteOrganizer {
        note_id,
        user_id,
        pinned: false,
    }
}

fn seed(store: &Store) -> Seeded {
    let alice = insert_user(store, "alice");
    let bob = insert_user(store, "bob");

    let a1 = insert_note(store, alice, "kept").id;
    let a2 = insert_note(store, alice, "deleted").id;
    let a3 = insert_note(store, alice, "related").id;
    let b1 = insert_note(store, bob, "bob's").id;

    let live = store
        .upsert(&Resource::new(alice, "keep.png").attached_to(a1))
        .unwrap()
        .id;
    let on_deleted = store
        .upsert(&Resource::new(alice, "gone.png").attached_to(a2))
        .unwrap()
        .id;
    store.upsert(&Resource::new(bob, "bob.png")).unwrap();

    store.upsert(&Shortcut::new(alice, "mine", "tag:rust")).unwrap();
    store.upsert(&Shortcut::new(bob, "his", "tag:go")).unwrap();

    store.upsert(&UserSetting::new(alice, "locale", "en")).unwrap();
    store.upsert(&UserSetting::new(bob, "locale", "de")).unwrap();

    store.upsert(&organizer(a1, alice)).unwrap();
    store.upsert(&organizer(a2, alice)).unwrap();
    store.upsert(&organizer(a1, bob)).unwrap();

    store.upsert(&NoteResource::new(a1, live)).unwrap();
    store.upsert(&NoteResource::new(a2, live)).unwrap();
    store.upsert(&NoteResource::new(a1, on_deleted)).unwrap();

    store
        .upsert(&NoteRelation::new(a1, a3, RelationType::Reference))
        .unwrap();
    store
        .upsert(&NoteRelation::new(a1, a2, RelationType::Reference))
        .unwrap();
    store
        .upsert(&NoteRelation::new(a1, b1, RelationType::Additional))
        .unwrap();

    store.upsert(&Tag::new("rust", alice)).unwrap();
    store.upsert(&Tag::new("go", bob)).unwrap();

    store.delete::<User>(&bob).unwrap();
    store.delete::<Note>(&a2).unwrap();

    Seeded {
        alice,
        bob,
        live_note: a1,
        bob_note: b1,
        live_resource: live,
    }
}

/// Row counts per kind, in vacuum step order.
fn counts(store: &Store) -> [usize; 8] {
    [
        store.list::<Note>(&NoteFilter::default()).unwrap().len(),
        store.list::<Resource>(&ResourceFilter::default()).unwrap().len(),
        store.list::<Shortcut>(&ShortcutFilter::default()).unwrap().len(),
        store.list::<UserSetting>(&UserSettingFilter::default()).unwrap().len(),
        store.list::<NoteOrganizer>(&NoteOrganizerFilter::default()).unwrap().len(),
        store.list::<NoteResource>(&NoteResourceFilter::default()).unwrap().len(),
        store.list::<NoteRelation>(&NoteRelationFilter::default()).unwrap().len(),
        store.list::<Tag>(&TagFilter::default()).unwrap().len(),
    ]
}

#[test]
fn vacuum_removes_every_kind_of_orphan() {
    let store = test_store();
    let ids = seed(&store);
    assert_eq!(counts(&store), [3, 3, 2, 2, 3, 3, 3, 2]);

    let report = store.vacuum(&CancellationToken::new()).unwrap();

    assert_eq!(report.deleted("note"), 1);
    assert_eq!(report.deleted("resource"), 2);
    assert_eq!(report.deleted("shortcut"), 1);
    assert_eq!(report.deleted("user_setting"), 1);
    assert_eq!(report.deleted("note_organizer"), 2);
    assert_eq!(report.deleted("note_resource"), 2);
    assert_eq!(report.deleted("note_relation"), 2);
    assert_eq!(report.deleted("tag"), 1);
    assert_eq!(report.total(), 12);

    assert_eq!(counts(&store), [2, 1, 1, 1, 1, 1, 1, 1]);
    assert!(store.find_by_id::<Note>(&ids.bob_note).unwrap_err().is_not_found());
}

#[test]
fn live_rows_survive_vacuum() {
    let store = test_store();
    let ids = seed(&store);
    store.vacuum(&CancellationToken::new()).unwrap();

    assert!(store.find_by_id::<Note>(&ids.live_note).is_ok());
    assert!(store.find_by_id::<Resource>(&ids.live_resource).is_ok());
    assert!(store
        .find_by_id::<NoteResource>(&(ids.live_note, ids.live_resource))
        .is_ok());
    assert!(store
        .find_by_id::<NoteOrganizer>(&(ids.live_note, ids.alice))
        .is_ok());
    assert!(store
        .find_by_id::<UserSetting>(&(ids.alice, "locale".to_string()))
        .is_ok());
    assert!(store.find_by_id::<Tag>(&("rust".to_string(), ids.alice)).is_ok());
}

#[test]
fn second_vacuum_is_a_no_op() {
    let store = test_store();
    seed(&store);

    store.vacuum(&CancellationToken::new()).unwrap();
    let after_first = counts(&store);

    let second = store.vacuum(&CancellationToken::new()).unwrap();
    assert_eq!(second.total(), 0);
    assert_eq!(second.steps.len(), 8);
    assert_eq!(counts(&store), after_first);
}

#[test]
fn vacuum_on_empty_store_reports_zero() {
    let store = test_store();
    let report = store.vacuum(&CancellationToken::new()).unwrap();
    assert_eq!(report.total(), 0);
}

#[test]
fn failing_step_rolls_back_earlier_steps() {
    let conn = test_db();
    conn.execute_batch(
        "CREATE TRIGGER block_relation_delete BEFORE DELETE ON note_relation
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .unwrap();
    let store = Store::new(conn, &CacheConfig::default());
    let ids = seed(&store);
    let before = counts(&store);

    let err = store.vacuum(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)), "got {err:?}");

    assert_eq!(counts(&store), before);
    assert!(store.find_by_id::<Note>(&ids.bob_note).is_ok());
}

#[test]
fn cancelled_vacuum_removes_nothing() {
    let store = test_store();
    seed(&store);
    let before = counts(&store);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = store.vacuum(&cancel).unwrap_err();

    assert!(matches!(err, StoreError::Cancelled), "got {err:?}");
    assert_eq!(counts(&store), before);
}

#[test]
fn vacuum_clears_cached_orphans() {
    let store = test_store();
    let ids = seed(&store);
    let bob_tag = ("go".to_string(), ids.bob);

    // Warm the cache with rows that vacuum is about to remove.
    store.find_by_id::<Tag>(&bob_tag).unwrap();
    store.find_by_id::<Note>(&ids.bob_note).unwrap();
    assert!(!store.caches().tags.is_empty());

    store.vacuum(&CancellationToken::new()).unwrap();

    assert!(store.caches().tags.is_empty());
    assert!(store.caches().notes.is_empty());
    assert!(store.find_by_id::<Tag>(&bob_tag).unwrap_err().is_not_found());
    assert!(store.find_by_id::<Note>(&ids.bob_note).unwrap_err().is_not_found());
}
