//! Request-level use cases over the storage backends.
//!
//! # Responsibility
//! - Compose store queries, enrichment and pagination for callers.
//! - Keep routing layers decoupled from backend details.

pub mod data_layer;

pub use data_layer::{
    AdminEntry, BlogError, BlogResult, DataLayer, EntryPage, LoginOutcome, RequestContext,
    ValidationIssue,
};
