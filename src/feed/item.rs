//! Per-note derivation of feed item fields.

use pulldown_cmark::{html, Options, Parser};

use crate::error::Result;
use crate::store::{Note, Resource, ResourceFilter, Store};

/// Titles without a `# ` heading are cut to this many characters.
pub const MAX_TITLE_LENGTH: usize = 100;

const TITLE_MARKER: &str = "# ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub length: i64,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Rendered HTML.
    pub description: String,
    /// Unix seconds.
    pub created_ts: i64,
    pub enclosure: Enclosure,
}

fn first_line(content: &str) -> &str {
    let line = content.split('\n').next().unwrap_or_default();
    line.strip_suffix('\r').unwrap_or(line)
}

fn has_title_marker(content: &str) -> bool {
    content.starts_with(TITLE_MARKER)
}

/// `# Heading` → `Heading`; otherwise the first line, cut to [`MAX_TITLE_LENGTH`]
/// characters with `...` appended when cut.
pub fn item_title(content: &str) -> String {
    let line = first_line(content);
    if has_title_marker(content) {
        return line[TITLE_MARKER.len()..].to_string();
    }
    if line.chars().count() <= MAX_TITLE_LENGTH {
        return line.to_string();
    }
    let mut title: String = line.chars().take(MAX_TITLE_LENGTH).collect();
    title.push_str("...");
    title
}

/// Markdown source of the item body: everything after a `# ` heading line,
/// space-trimmed, or the whole content when there is no heading.
pub fn item_body(content: &str) -> &str {
    if !has_title_marker(content) {
        return content;
    }
    match content.split_once('\n') {
        Some((_, rest)) => rest.trim_matches(' '),
        None => "",
    }
}

/// Markdown to HTML. Never fails: markup that does not parse renders as text.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(source, options));
    out
}

pub fn item_link(base_url: &str, note_id: i64) -> String {
    format!("{base_url}/m/{note_id}")
}

/// External resources are linked verbatim; stored ones through the public
/// resource route.
pub fn resource_url(base_url: &str, resource: &Resource) -> String {
    if !resource.external_link.is_empty() {
        return resource.external_link.clone();
    }
    format!(
        "{base_url}/o/r/{}/{}/{}",
        resource.id, resource.public_id, resource.filename
    )
}

pub fn enclosure_for(base_url: &str, note_id: i64, resources: &[Resource]) -> Enclosure {
    match resources.first() {
        Some(resource) => Enclosure {
            url: resource_url(base_url, resource),
            length: resource.size,
            mime_type: resource.mime_type.clone(),
        },
        None => Enclosure {
            url: format!("{}/image", item_link(base_url, note_id)),
            length: 0,
            mime_type: String::new(),
        },
    }
}

/// Derive every item field for `note`, listing its attachments from `store`.
pub fn build_item(store: &Store, note: &Note, base_url: &str) -> Result<FeedItem> {
    let resources = store.list::<Resource>(&ResourceFilter::for_note(note.id))?;
    Ok(FeedItem {
        title: item_title(&note.content),
        link: item_link(base_url, note.id),
        description: render_markdown(item_body(&note.content)),
        created_ts: note.created_ts,
        enclosure: enclosure_for(base_url, note.id, &resources),
    })
}
