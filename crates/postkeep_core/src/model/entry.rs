//! Blog entry model.
//!
//! # Responsibility
//! - Define the raw stored entry and the insert request shape.
//!
//! # Invariants
//! - `slug` + `creation_date` identify an entry for permalink lookups.
//! - `creation_date` never changes after insert; `last_date` starts equal to it.

use chrono::NaiveDate;
use serde::Serialize;

/// Backend identity of a stored record.
///
/// SQLite rowid for the relational backend, store-allocated key for the
/// document backend. Both are monotonically increasing per store.
pub type RecordId = i64;

/// Raw entry as fetched from a storage backend, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: RecordId,
    /// URL-safe identifier derived from `title`.
    pub slug: String,
    pub title: String,
    /// Markdown source.
    pub body: String,
    pub creation_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Owning user id.
    pub owner: RecordId,
    /// Tag names. Populated natively by the document store; the relational
    /// backend leaves this empty until the enrichment pipeline hydrates it.
    pub tags: Vec<String>,
}

impl Entry {
    /// Permanent URL path of this entry, built from creation date and slug.
    pub fn permalink(&self) -> String {
        permalink(self.creation_date, &self.slug)
    }
}

/// Builds `/articles/<year>/<month>/<day>/<slug>` without zero padding.
pub fn permalink(date: NaiveDate, slug: &str) -> String {
    use chrono::Datelike;
    format!(
        "/articles/{}/{}/{}/{}",
        date.year(),
        date.month(),
        date.day(),
        slug
    )
}

/// Insert request handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub body: String,
    pub owner: RecordId,
    /// Whitespace-separated tag names, possibly empty.
    pub tags: String,
    /// Creation date chosen by the caller (today for live inserts).
    pub created_on: NaiveDate,
}

/// Paging/filter options for entry listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    /// Optional single-tag exact match filter (case-sensitive).
    pub tag: Option<String>,
    pub offset: u32,
    pub limit: u32,
}
