//! Presentation-side content helpers.
//!
//! # Responsibility
//! - Derive slugs, humanized dates and rendered HTML from stored entries.
//! - Run the enrichment pipeline that turns raw entries into display entries.

pub mod date;
pub mod enrich;
pub mod render;
pub mod slug;

pub use enrich::{enrich_entries, EnrichedEntry};
pub use render::RenderMode;
