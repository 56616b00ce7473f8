//! Blog domain model shared by both storage backends.
//!
//! # Responsibility
//! - Define the canonical entry/user/tag shapes returned by every backend.
//! - Keep backend-specific identity behind one numeric `RecordId`.
//!
//! # Invariants
//! - `Entry::slug` is always derived from `Entry::title`, never user-supplied.
//! - Entries and tag associations are only ever created, never updated here.

pub mod entry;
pub mod tag;
pub mod user;
