//! Relational backend bootstrap: connection setup and schema upgrades.
//!
//! Every connection handed to `SqliteStore` has foreign keys on, a busy
//! timeout, the current blog schema and both account ranks present.
//! Failures surface as `StoreError` so callers see one error type per store.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
