//! Content data layer for the Postkeep blog.
//!
//! Serves tag-aware, paginated and enriched entry listings from either a
//! SQLite database or an in-process document store behind one contract.

pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod service;
pub mod store;

pub use config::{BackendKind, ConfigError, DataLayerConfig};
pub use content::{EnrichedEntry, RenderMode};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{Entry, EntryQuery, NewEntry, RecordId};
pub use model::user::{Role, User, UserProfile};
pub use pagination::{page_window, total_pages, PageSlot, PaginationError};
pub use service::{
    AdminEntry, BlogError, BlogResult, DataLayer, EntryPage, LoginOutcome, RequestContext,
    ValidationIssue,
};
pub use store::{Backend, ContentStore, QueryArg, StoreError, StoreResult, StoreSession};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
