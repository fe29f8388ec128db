mod helpers;

use helpers::{insert_public_note, insert_user, test_store};
use jotter::feed::profile::{CustomizedProfile, CUSTOMIZED_PROFILE_SETTING};
use jotter::feed::{compose, public_feed, MAX_ITEMS};
use jotter::store::{
    Note, NoteFilter, NoteResource, Resource, RowStatus, SystemSetting, Visibility,
};

const BASE: &str = "https://notes.example";

fn item_count(xml: &str) -> usize {
    xml.matches("<item>").count()
}

#[test]
fn at_most_max_items_in_input_order() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    for i in 0..150 {
        insert_public_note(&store, user, &format!("note {i}"), 1_000 + i);
    }
    let notes = store.list::<Note>(&NoteFilter::public(None)).unwrap();
    assert_eq!(notes.len(), 150);

    let xml = compose(&store, &notes, BASE, &CustomizedProfile::default()).unwrap();

    assert_eq!(item_count(&xml), MAX_ITEMS);
    // Newest first: note 149 leads, note 50 is the hundredth, note 49 is dropped.
    let first = xml.find("<title>note 149</title>").unwrap();
    let last = xml.find("<title>note 50</title>").unwrap();
    assert!(first < last);
    assert!(!xml.contains("<title>note 49</title>"));
}

#[test]
fn heading_note_becomes_titled_item() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let note = insert_public_note(&store, user, "# My Title\nBody text", 1_700_000_000);

    let xml = compose(&store, &[note.clone()], BASE, &CustomizedProfile::default()).unwrap();

    assert!(xml.contains("<title>My Title</title>"));
    assert!(xml.contains("&lt;p&gt;Body text&lt;/p&gt;"));
    assert!(xml.contains(&format!("<link>{BASE}/m/{}</link>", note.id)));
    assert!(xml.contains("<pubDate>Tue, 14 Nov 2023 22:13:20 +0000</pubDate>"));
    assert!(xml.contains(&format!("url=\"{BASE}/m/{}/image\"", note.id)));
    assert!(xml.contains("length=\"0\""));
}

#[test]
fn internal_attachment_uses_public_resource_route() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let note = insert_public_note(&store, user, "with a photo", 10);
    let mut resource = Resource::new(user, "photo.png").attached_to(note.id);
    resource.size = 2048;
    resource.mime_type = "image/png".into();
    let resource = store.upsert(&resource).unwrap();
    assert!(!resource.public_id.is_empty());

    let xml = compose(&store, &[note], BASE, &CustomizedProfile::default()).unwrap();

    let expected = format!(
        "url=\"{BASE}/o/r/{}/{}/photo.png\"",
        resource.id, resource.public_id
    );
    assert!(xml.contains(&expected), "missing {expected} in {xml}");
    assert!(xml.contains("length=\"2048\""));
    assert!(xml.contains("type=\"image/png\""));
}

#[test]
fn linked_attachment_becomes_enclosure() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let owner = insert_public_note(&store, user, "owner", 10);
    let linked = insert_public_note(&store, user, "borrows a file", 20);
    let mut resource = Resource::new(user, "shared.pdf").attached_to(owner.id);
    resource.size = 512;
    resource.mime_type = "application/pdf".into();
    let resource = store.upsert(&resource).unwrap();
    store
        .upsert(&NoteResource::new(linked.id, resource.id))
        .unwrap();

    let xml = compose(&store, &[linked.clone()], BASE, &CustomizedProfile::default()).unwrap();

    let expected = format!(
        "url=\"{BASE}/o/r/{}/{}/shared.pdf\"",
        resource.id, resource.public_id
    );
    assert!(xml.contains(&expected), "missing {expected} in {xml}");
    assert!(!xml.contains(&format!("{BASE}/m/{}/image", linked.id)));
    assert!(xml.contains("type=\"application/pdf\""));
}

#[test]
fn owned_attachment_wins_over_linked_one() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let other = insert_public_note(&store, user, "other", 10);
    let note = insert_public_note(&store, user, "both kinds", 20);

    let mut early = Resource::new(user, "linked-early.png").attached_to(other.id);
    early.created_ts = 1;
    let early = store.upsert(&early).unwrap();
    store.upsert(&NoteResource::new(note.id, early.id)).unwrap();
    let mut own = Resource::new(user, "own-late.png").attached_to(note.id);
    own.created_ts = 2;
    store.upsert(&own).unwrap();

    let xml = compose(&store, &[note], BASE, &CustomizedProfile::default()).unwrap();
    assert!(xml.contains("/own-late.png\""));
    assert!(!xml.contains("linked-early.png"));
}

#[test]
fn external_attachment_is_linked_verbatim() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let note = insert_public_note(&store, user, "linked", 10);
    let mut resource = Resource::new(user, "clip.mp4").attached_to(note.id);
    resource.external_link = "https://cdn.example/clip.mp4".into();
    store.upsert(&resource).unwrap();

    let xml = compose(&store, &[note], BASE, &CustomizedProfile::default()).unwrap();
    assert!(xml.contains("url=\"https://cdn.example/clip.mp4\""));
}

#[test]
fn non_public_notes_are_never_emitted() {
    let store = test_store();
    let user = insert_user(&store, "ada");
    let public = insert_public_note(&store, user, "visible", 20);
    let private = store.upsert(&Note::new(user, "secret")).unwrap();
    let archived = store
        .upsert(
            &Note::new(user, "old news")
                .with_visibility(Visibility::Public)
                .with_row_status(RowStatus::Archived),
        )
        .unwrap();

    let xml = compose(
        &store,
        &[private, public, archived],
        BASE,
        &CustomizedProfile::default(),
    )
    .unwrap();

    assert_eq!(item_count(&xml), 1);
    assert!(xml.contains("visible"));
    assert!(!xml.contains("secret"));
    assert!(!xml.contains("old news"));
}

#[test]
fn public_feed_filters_by_author() {
    let store = test_store();
    let ada = insert_user(&store, "ada");
    let bob = insert_user(&store, "bob");
    insert_public_note(&store, ada, "from ada", 10);
    insert_public_note(&store, bob, "from bob", 20);
    store
        .upsert(&Note::new(ada, "ada private").with_visibility(Visibility::Protected))
        .unwrap();

    let site = public_feed(&store, BASE, None).unwrap();
    assert_eq!(item_count(&site), 2);
    assert!(site.find("from bob").unwrap() < site.find("from ada").unwrap());

    let ada_only = public_feed(&store, BASE, Some(ada)).unwrap();
    assert_eq!(item_count(&ada_only), 1);
    assert!(ada_only.contains("from ada"));
    assert!(!ada_only.contains("ada private"));
}

#[test]
fn empty_feed_is_a_valid_channel() {
    let store = test_store();
    let xml = public_feed(&store, BASE, None).unwrap();
    assert_eq!(item_count(&xml), 0);
    assert!(xml.contains("<channel>"));
    assert!(xml.contains("<title>memos</title>"));
    assert!(xml.contains("<language>en</language>"));
}

#[test]
fn channel_uses_stored_profile_and_trims_base_url() {
    let store = test_store();
    store
        .upsert(&SystemSetting::new(
            CUSTOMIZED_PROFILE_SETTING,
            r#"{"name":"Field Notes","description":"Daily jottings","locale":"fr"}"#,
        ))
        .unwrap();
    let user = insert_user(&store, "ada");
    let note = insert_public_note(&store, user, "hello", 10);

    let xml = public_feed(&store, "https://notes.example/", None).unwrap();

    assert!(xml.contains("<title>Field Notes</title>"));
    assert!(xml.contains("<description>Daily jottings</description>"));
    assert!(xml.contains("<language>fr</language>"));
    assert!(xml.contains("<link>https://notes.example</link>"));
    assert!(xml.contains(&format!("<link>https://notes.example/m/{}</link>", note.id)));
}
