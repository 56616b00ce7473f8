//! Entry/tag association over the relational join table.
//!
//! # Invariants
//! - Tag names are unique (`idx_tags_name`), so resolve-or-create is an
//!   `INSERT OR IGNORE` followed by a re-read and cannot mint duplicates.
//! - Associations are insert-only and idempotent per `(entry, tag)` pair.
//! - `tags_for` returns names in association order.

use crate::model::entry::RecordId;
use crate::store::StoreResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Looks up a tag id by exact (case-sensitive) name.
pub fn find_tag(conn: &Connection, name: &str) -> StoreResult<Option<RecordId>> {
    let id = conn
        .query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

/// Returns the id of tag `name`, creating the tag when absent.
pub fn resolve_or_create_tag(conn: &Connection, name: &str) -> StoreResult<RecordId> {
    if let Some(id) = find_tag(conn, name)? {
        return Ok(id);
    }

    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
    let id = conn.query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Associates one tag with one entry.
pub fn attach(conn: &Connection, entry_id: RecordId, tag_id: RecordId) -> StoreResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2);",
        params![entry_id, tag_id],
    )?;
    Ok(())
}

/// Resolves and attaches every tag name to `entry_id`.
pub fn attach_all(conn: &Connection, entry_id: RecordId, names: &[String]) -> StoreResult<()> {
    for name in names {
        let tag_id = resolve_or_create_tag(conn, name)?;
        attach(conn, entry_id, tag_id)?;
    }
    Ok(())
}

/// Reverse join: tag names attached to `entry_id`.
pub fn tags_for(conn: &Connection, entry_id: RecordId) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM entry_tags et
         INNER JOIN tags t ON t.id = et.tag_id
         WHERE et.entry_id = ?1
         ORDER BY et.rowid ASC;",
    )?;
    let mut rows = stmt.query([entry_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}
