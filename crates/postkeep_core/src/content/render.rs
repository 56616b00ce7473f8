//! Markdown rendering and read-more truncation.
//!
//! # Invariants
//! - The cut marker is the rendered thematic break (`<hr />`); only the first
//!   occurrence after position 0 is treated as a cut.
//! - Rendering consumes the cut marker, so it must run once per raw fetch.
//! - Every rendered body ends with a trailing `<hr />` separator.

use crate::model::entry::Entry;
use pulldown_cmark::{html, Options, Parser};

/// Rendered form of a Markdown thematic break; doubles as the cut marker.
pub const CUT_MARKER: &str = "<hr />";

const DETAIL_BREAK: &str = "<br />";

/// How the cut marker is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Single-entry view: the marker becomes a line break, nothing is dropped.
    Detail,
    /// Listing view: the marker becomes a read-more link, the rest is dropped.
    Summary,
}

impl RenderMode {
    /// A batch of one entry is a detail view; any other batch is a listing.
    pub fn for_batch(len: usize) -> Self {
        if len == 1 {
            Self::Detail
        } else {
            Self::Summary
        }
    }
}

/// Converts Markdown source to HTML.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut rendered = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}

/// Renders an entry body and applies the cut-marker rule for `mode`.
pub fn render_entry_content(entry: &Entry, mode: RenderMode) -> String {
    let rendered = render_markdown(&entry.body);
    let mut content = match rendered.find(CUT_MARKER) {
        Some(index) if index > 0 => {
            let (head, rest) = rendered.split_at(index);
            match mode {
                RenderMode::Detail => {
                    format!("{head}{DETAIL_BREAK}{}", &rest[CUT_MARKER.len()..])
                }
                RenderMode::Summary => format!("{head}{}", read_more_link(entry)),
            }
        }
        _ => rendered,
    };
    content.push_str(CUT_MARKER);
    content
}

fn read_more_link(entry: &Entry) -> String {
    maud::html! {
        a.readmore href=(entry.permalink()) {
            " Read more about \"" (entry.title) "\"..."
        }
    }
    .into_string()
}
