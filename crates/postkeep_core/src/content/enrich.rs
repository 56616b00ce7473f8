//! Enrichment pipeline from stored entries to display-ready entries.
//!
//! Steps run in a fixed order, each mutating the batch in place:
//! humanized date, tag hydration, content rendering, author hydration.
//! A batch of exactly one entry renders as a detail view, any other batch as
//! a listing (see `RenderMode::for_batch`).
//!
//! # Invariants
//! - Tag hydration replaces the tag list, so repeating it is a no-op.
//! - Content rendering reads the raw body and runs once per fetched batch.
//! - An owner that no longer resolves leaves `author` empty.

use crate::content::date::humanize_date;
use crate::content::render::{render_entry_content, RenderMode};
use crate::model::entry::{Entry, RecordId};
use crate::store::{ContentStore, StoreResult};
use serde::Serialize;
use std::collections::HashMap;

/// Stored entry plus derived presentation fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEntry {
    pub entry: Entry,
    /// `"%d %b"` upper-cased, e.g. `05 JAN`.
    pub human_date: String,
    pub tags: Vec<String>,
    /// Rendered HTML body.
    pub content: String,
    pub author: Option<String>,
}

impl EnrichedEntry {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            human_date: String::new(),
            tags: Vec::new(),
            content: String::new(),
            author: None,
        }
    }

    pub fn permalink(&self) -> String {
        self.entry.permalink()
    }
}

/// Runs every enrichment step over `entries`.
pub fn enrich_entries<S: ContentStore + ?Sized>(
    store: &S,
    entries: Vec<Entry>,
) -> StoreResult<Vec<EnrichedEntry>> {
    let mode = RenderMode::for_batch(entries.len());
    let mut enriched: Vec<EnrichedEntry> = entries.into_iter().map(EnrichedEntry::new).collect();
    humanize_dates(&mut enriched);
    hydrate_tags(store, &mut enriched)?;
    render_contents(&mut enriched, mode);
    hydrate_authors(store, &mut enriched)?;
    Ok(enriched)
}

pub fn humanize_dates(entries: &mut [EnrichedEntry]) {
    for item in entries {
        item.human_date = humanize_date(item.entry.creation_date);
    }
}

/// Replaces each entry's tag list with the backend's current associations.
pub fn hydrate_tags<S: ContentStore + ?Sized>(
    store: &S,
    entries: &mut [EnrichedEntry],
) -> StoreResult<()> {
    for item in entries {
        let tags = store.entry_tags(&item.entry)?;
        item.entry.tags.clone_from(&tags);
        item.tags = tags;
    }
    Ok(())
}

pub fn render_contents(entries: &mut [EnrichedEntry], mode: RenderMode) {
    for item in entries {
        item.content = render_entry_content(&item.entry, mode);
    }
}

/// Resolves owner ids to usernames, looking each owner up once.
pub fn hydrate_authors<S: ContentStore + ?Sized>(
    store: &S,
    entries: &mut [EnrichedEntry],
) -> StoreResult<()> {
    let mut authors: HashMap<RecordId, Option<String>> = HashMap::new();
    for item in entries {
        let owner = item.entry.owner;
        let author = match authors.get(&owner) {
            Some(author) => author.clone(),
            None => {
                let author = store.user_by_id(owner)?.map(|user| user.username);
                authors.insert(owner, author.clone());
                author
            }
        };
        item.author = author;
    }
    Ok(())
}
