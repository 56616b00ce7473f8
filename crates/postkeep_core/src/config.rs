//! Data layer configuration.
//!
//! # Responsibility
//! - Describe which backend serves content and how entries are paged.
//! - Reject unusable settings before any backend is constructed.
//!
//! # Invariants
//! - Exactly two backend selectors exist; anything else is fatal.
//! - `max_page_entries` is never zero after `validate`.

use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of entries shown per listing page.
pub const DEFAULT_MAX_PAGE_ENTRIES: u32 = 10;

/// Storage technology selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Relational backend over SQLite.
    Sqlite,
    /// In-process schema-less document backend.
    Document,
}

impl BackendKind {
    /// Parses a configuration selector string.
    ///
    /// `gae` is accepted as an alias of `docstore`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "docstore" | "gae" => Ok(Self::Document),
            _ => Err(ConfigError::UnknownBackend(value.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Document => "docstore",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BackendKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Fatal configuration problems.
#[derive(Debug)]
pub enum ConfigError {
    /// Backend selector is neither `sqlite` nor `docstore`.
    UnknownBackend(String),
    /// Page size of zero.
    ZeroPageSize,
    /// SQLite backend selected without a database path.
    MissingDatabasePath,
    /// Configuration text could not be decoded.
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => write!(
                f,
                "unknown storage backend `{value}`; expected sqlite|docstore"
            ),
            Self::ZeroPageSize => write!(f, "max_page_entries must be greater than zero"),
            Self::MissingDatabasePath => {
                write!(f, "database_path is required for the sqlite backend")
            }
            Self::Parse(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::UnknownBackend(_) | Self::ZeroPageSize | Self::MissingDatabasePath => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings consumed by `DataLayer::new`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataLayerConfig {
    pub backend: BackendKind,
    #[serde(default = "default_max_page_entries")]
    pub max_page_entries: u32,
    /// SQLite database file; ignored by the document backend.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_max_page_entries() -> u32 {
    DEFAULT_MAX_PAGE_ENTRIES
}

impl DataLayerConfig {
    pub fn sqlite(database_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            max_page_entries: DEFAULT_MAX_PAGE_ENTRIES,
            database_path: Some(database_path.into()),
        }
    }

    pub fn document() -> Self {
        Self {
            backend: BackendKind::Document,
            max_page_entries: DEFAULT_MAX_PAGE_ENTRIES,
            database_path: None,
        }
    }

    pub fn with_max_page_entries(mut self, max_page_entries: u32) -> Self {
        self.max_page_entries = max_page_entries;
        self
    }

    /// Decodes and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks page size and backend-specific requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_entries == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.backend == BackendKind::Sqlite
            && self
                .database_path
                .as_ref()
                .map_or(true, |path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::MissingDatabasePath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, ConfigError, DataLayerConfig, DEFAULT_MAX_PAGE_ENTRIES};
    use std::path::PathBuf;

    #[test]
    fn backend_selector_accepts_exactly_two_backends() {
        assert_eq!(BackendKind::parse("sqlite").unwrap(), BackendKind::Sqlite);
        assert_eq!(BackendKind::parse(" GAE ").unwrap(), BackendKind::Document);
        assert_eq!("docstore".parse::<BackendKind>().unwrap(), BackendKind::Document);
        assert!(matches!(
            BackendKind::parse("mysql"),
            Err(ConfigError::UnknownBackend(value)) if value == "mysql"
        ));
    }

    #[test]
    fn json_config_applies_defaults() {
        let config = DataLayerConfig::from_json_str(r#"{"backend": "docstore"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Document);
        assert_eq!(config.max_page_entries, DEFAULT_MAX_PAGE_ENTRIES);
        assert_eq!(config.database_path, None);

        let config = DataLayerConfig::from_json_str(
            r#"{"backend": "sqlite", "max_page_entries": 3, "database_path": "/tmp/blog.db"}"#,
        )
        .unwrap();
        assert_eq!(config.max_page_entries, 3);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/blog.db")));
    }

    #[test]
    fn json_config_rejects_unknown_backend() {
        let err = DataLayerConfig::from_json_str(r#"{"backend": "redis"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn validate_rejects_zero_page_size_and_missing_path() {
        assert!(matches!(
            DataLayerConfig::document().with_max_page_entries(0).validate(),
            Err(ConfigError::ZeroPageSize)
        ));

        let mut config = DataLayerConfig::sqlite("/tmp/blog.db");
        config.database_path = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDatabasePath)
        ));
    }
}
