//! Storage backend contract and the two backend implementations.
//!
//! # Responsibility
//! - Define the backend-neutral `ContentStore` contract used by the facade.
//! - Select one of exactly two backends from configuration.
//! - Hand out one session per request and release it on every exit path.
//!
//! # Invariants
//! - Lookups that match nothing return `Ok(None)`, never an error.
//! - Entry listings are ordered by `creation_date DESC, id DESC` on both backends.
//! - Date arguments are pre-validated calendar dates.
//! - No operation retries; backend failures propagate unchanged.

use crate::config::{BackendKind, ConfigError, DataLayerConfig};
use crate::model::entry::{Entry, EntryQuery, NewEntry, RecordId};
use crate::model::user::{Role, User, UserProfile};
use chrono::NaiveDate;
use log::debug;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod docstore;
pub mod sqlite;

pub use docstore::{DocumentSession, DocumentStore, QueryError};
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic record returned by raw queries: column/property name to value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Backend failure surfaced to the facade.
#[derive(Debug)]
pub enum StoreError {
    /// Relational backend transport failure.
    Sqlite(rusqlite::Error),
    /// Database was written by a newer schema than this build knows.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// A migrated database lacks rows every install must carry.
    MissingSeed(String),
    /// Document query template could not be translated or parsed.
    Query(QueryError),
    /// Stored data does not match the domain model.
    InvalidData(String),
    /// A uniquely-named record already exists.
    Duplicate(String),
    /// Backend cannot serve requests (for example a poisoned store lock).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "blog schema version {found} is newer than supported version {supported}"
            ),
            Self::MissingSeed(what) => write!(f, "database seed missing: {what}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Duplicate(message) => write!(f, "duplicate record: {message}"),
            Self::Unavailable(message) => write!(f, "storage backend unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::MissingSeed(_)
            | Self::InvalidData(_)
            | Self::Duplicate(_)
            | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<QueryError> for StoreError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Positional argument for raw query templates.
///
/// Bound as a parameter by SQLite; substituted textually by the document
/// store, where `Display` gives the substituted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    Int(i64),
    Text(String),
}

impl Display for QueryArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl ToSql for QueryArg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Int(value) => ToSqlOutput::Owned(SqlValue::Integer(*value)),
            Self::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

impl From<i64> for QueryArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for QueryArg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for QueryArg {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format(DATE_FORMAT).to_string())
    }
}

/// Storage format of entry dates on both backends.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unified operation contract implemented by both storage backends.
pub trait ContentStore {
    /// Which backend variant serves this session.
    fn backend_kind(&self) -> BackendKind;
    /// Runs a backend-native query template with positional `?` arguments.
    fn raw_query(&self, template: &str, args: &[QueryArg]) -> StoreResult<Vec<RawRecord>>;
    /// Counts all entries, or only those carrying `tag`.
    fn entry_count(&self, tag: Option<&str>) -> StoreResult<u64>;
    /// Lists entries newest first, optionally restricted to one tag.
    fn entries(&self, query: &EntryQuery) -> StoreResult<Vec<Entry>>;
    /// Finds the entry with exactly this slug and creation date.
    ///
    /// When several match, the one with the highest id is returned.
    fn entry_by_slug_and_date(&self, slug: &str, date: NaiveDate) -> StoreResult<Option<Entry>>;
    /// Persists a new entry and processes its tag string.
    fn insert_entry(&mut self, new_entry: &NewEntry) -> StoreResult<Entry>;
    /// Associates tag names with an existing entry.
    fn process_tags(&mut self, entry_id: RecordId, tags: &[String]) -> StoreResult<()>;
    /// Reads the tag names currently associated with `entry`.
    fn entry_tags(&self, entry: &Entry) -> StoreResult<Vec<String>>;
    fn user_by_name(&self, username: &str) -> StoreResult<Option<User>>;
    fn user_by_id(&self, id: RecordId) -> StoreResult<Option<User>>;
    fn user_profile(&self, id: RecordId) -> StoreResult<Option<UserProfile>>;
    /// Bootstrap-only account creation; `password_digest` is stored as-is.
    fn provision_user(
        &mut self,
        username: &str,
        password_digest: &str,
        role: Role,
    ) -> StoreResult<User>;
    /// Releases the session.
    fn close(self) -> StoreResult<()>
    where
        Self: Sized;
}

/// Backend selected at startup; hands out per-request sessions.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Each session opens its own connection to the database file.
    Sqlite { path: PathBuf },
    /// Sessions share the process-wide in-memory document store.
    Document(DocumentStore),
}

impl Backend {
    /// Factory: maps a validated configuration onto one backend variant.
    pub fn from_config(config: &DataLayerConfig) -> Result<Self, ConfigError> {
        match config.backend {
            BackendKind::Sqlite => {
                let path = config
                    .database_path
                    .clone()
                    .ok_or(ConfigError::MissingDatabasePath)?;
                Ok(Self::Sqlite { path })
            }
            BackendKind::Document => Ok(Self::Document(DocumentStore::new())),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Sqlite { .. } => BackendKind::Sqlite,
            Self::Document(_) => BackendKind::Document,
        }
    }

    /// Acquires one session for the duration of a request.
    pub fn connect(&self) -> StoreResult<StoreSession> {
        let session = match self {
            Self::Sqlite { path } => StoreSession::Sqlite(SqliteStore::open(path)?),
            Self::Document(store) => StoreSession::Document(store.session()),
        };
        debug!(
            "event=store_connect module=store status=ok backend={}",
            self.kind().as_str()
        );
        Ok(session)
    }
}

/// Closed set of backend sessions behind the `ContentStore` contract.
#[derive(Debug)]
pub enum StoreSession {
    Sqlite(SqliteStore),
    Document(DocumentSession),
}

macro_rules! dispatch {
    ($session:expr, $store:ident => $call:expr) => {
        match $session {
            StoreSession::Sqlite($store) => $call,
            StoreSession::Document($store) => $call,
        }
    };
}

impl ContentStore for StoreSession {
    fn backend_kind(&self) -> BackendKind {
        dispatch!(self, store => store.backend_kind())
    }

    fn raw_query(&self, template: &str, args: &[QueryArg]) -> StoreResult<Vec<RawRecord>> {
        dispatch!(self, store => store.raw_query(template, args))
    }

    fn entry_count(&self, tag: Option<&str>) -> StoreResult<u64> {
        dispatch!(self, store => store.entry_count(tag))
    }

    fn entries(&self, query: &EntryQuery) -> StoreResult<Vec<Entry>> {
        dispatch!(self, store => store.entries(query))
    }

    fn entry_by_slug_and_date(&self, slug: &str, date: NaiveDate) -> StoreResult<Option<Entry>> {
        dispatch!(self, store => store.entry_by_slug_and_date(slug, date))
    }

    fn insert_entry(&mut self, new_entry: &NewEntry) -> StoreResult<Entry> {
        dispatch!(self, store => store.insert_entry(new_entry))
    }

    fn process_tags(&mut self, entry_id: RecordId, tags: &[String]) -> StoreResult<()> {
        dispatch!(self, store => store.process_tags(entry_id, tags))
    }

    fn entry_tags(&self, entry: &Entry) -> StoreResult<Vec<String>> {
        dispatch!(self, store => store.entry_tags(entry))
    }

    fn user_by_name(&self, username: &str) -> StoreResult<Option<User>> {
        dispatch!(self, store => store.user_by_name(username))
    }

    fn user_by_id(&self, id: RecordId) -> StoreResult<Option<User>> {
        dispatch!(self, store => store.user_by_id(id))
    }

    fn user_profile(&self, id: RecordId) -> StoreResult<Option<UserProfile>> {
        dispatch!(self, store => store.user_profile(id))
    }

    fn provision_user(
        &mut self,
        username: &str,
        password_digest: &str,
        role: Role,
    ) -> StoreResult<User> {
        dispatch!(self, store => store.provision_user(username, password_digest, role))
    }

    fn close(self) -> StoreResult<()> {
        let kind = self.backend_kind();
        let result = dispatch!(self, store => store.close());
        debug!(
            "event=store_close module=store status={} backend={}",
            if result.is_ok() { "ok" } else { "error" },
            kind.as_str()
        );
        result
    }
}
