//! RSS 2.0 feed composition.
//!
//! [`compose`] turns an already-filtered, already-ordered list of notes into an
//! RSS document; [`public_feed`] is the read pipeline behind the site-wide and
//! per-author feeds (filter → profile → compose).

pub mod item;
pub mod profile;

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::error::StoreError;
use crate::store::{Note, NoteFilter, Store};
use item::{build_item, FeedItem};
use profile::{get_customized_profile, CustomizedProfile};

/// At most this many notes are turned into items.
pub const MAX_ITEMS: usize = 100;

/// Content type feeds are served with.
pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write feed XML: {0}")]
    Xml(String),
}

/// Build an RSS document from `notes`.
///
/// Callers pass notes that are normal and public, newest first; order is kept
/// and only the first [`MAX_ITEMS`] are used. A note that is not publicly
/// listed is skipped rather than emitted.
pub fn compose(
    store: &Store,
    notes: &[Note],
    base_url: &str,
    profile: &CustomizedProfile,
) -> Result<String, FeedError> {
    let base_url = base_url.trim_end_matches('/');

    let mut items = Vec::with_capacity(notes.len().min(MAX_ITEMS));
    for note in notes.iter().take(MAX_ITEMS) {
        if !note.is_publicly_listed() {
            tracing::warn!(
                note_id = note.id,
                visibility = %note.visibility,
                row_status = %note.row_status,
                "skipping non-public note handed to feed"
            );
            continue;
        }
        items.push(build_item(store, note, base_url)?);
    }

    let channel = Channel {
        title: &profile.name,
        link: base_url,
        description: &profile.description,
        language: &profile.locale,
        pub_date: chrono::Utc::now().to_rfc2822(),
    };
    let xml = write_rss(&channel, &items)?;
    tracing::debug!(items = items.len(), "feed composed");
    Ok(xml)
}

/// Public notes (optionally of one author), newest first, as an RSS document.
pub fn public_feed(
    store: &Store,
    base_url: &str,
    creator_id: Option<i64>,
) -> Result<String, FeedError> {
    let profile = get_customized_profile(store)?;
    let filter = NoteFilter {
        limit: Some(MAX_ITEMS),
        ..NoteFilter::public(creator_id)
    };
    let notes = store.list::<Note>(&filter)?;
    compose(store, &notes, base_url, &profile)
}

struct Channel<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    language: &'a str,
    pub_date: String,
}

/// Drop characters XML 1.0 cannot carry (control characters other than tab/newline/CR).
fn xml_safe(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}');
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn emit(w: &mut XmlWriter, event: Event<'_>) -> Result<(), FeedError> {
    w.write_event(event).map_err(|e| FeedError::Xml(e.to_string()))
}

fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), FeedError> {
    emit(w, Event::Start(BytesStart::new(name)))?;
    emit(w, Event::Text(BytesText::new(&xml_safe(text))))?;
    emit(w, Event::End(BytesEnd::new(name)))
}

fn write_item(w: &mut XmlWriter, item: &FeedItem) -> Result<(), FeedError> {
    emit(w, Event::Start(BytesStart::new("item")))?;
    text_element(w, "title", &item.title)?;
    text_element(w, "link", &item.link)?;
    text_element(w, "description", &item.description)?;

    let length = item.enclosure.length.to_string();
    let url = xml_safe(&item.enclosure.url);
    let mime_type = xml_safe(&item.enclosure.mime_type);
    let enclosure = BytesStart::new("enclosure").with_attributes([
        ("url", url.as_ref()),
        ("length", length.as_str()),
        ("type", mime_type.as_ref()),
    ]);
    emit(w, Event::Empty(enclosure))?;

    text_element(w, "guid", &item.link)?;
    if let Some(created) = chrono::DateTime::from_timestamp(item.created_ts, 0) {
        text_element(w, "pubDate", &created.to_rfc2822())?;
    }
    emit(w, Event::End(BytesEnd::new("item")))
}

fn write_rss(channel: &Channel<'_>, items: &[FeedItem]) -> Result<String, FeedError> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("rss").with_attributes([("version", "2.0")])),
    )?;
    emit(&mut w, Event::Start(BytesStart::new("channel")))?;
    text_element(&mut w, "title", channel.title)?;
    text_element(&mut w, "link", channel.link)?;
    text_element(&mut w, "description", channel.description)?;
    text_element(&mut w, "language", channel.language)?;
    text_element(&mut w, "pubDate", &channel.pub_date)?;
    for item in items {
        write_item(&mut w, item)?;
    }
    emit(&mut w, Event::End(BytesEnd::new("channel")))?;
    emit(&mut w, Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(w.into_inner()).map_err(|e| FeedError::Xml(e.to_string()))
}
