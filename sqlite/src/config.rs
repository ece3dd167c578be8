//! Database configuration.
//!
//! Every key is optional; a missing key takes its default.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/game.db
//! bind_mode: parameters
//! check_schema: true
//! create_tables: true
//! foreign_keys: true
//! busy_timeout_ms: 2000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rowforge_core::BindMode;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for opening a [`Database`](crate::Database).
///
/// # Examples
///
/// ```
/// use rowforge_core::BindMode;
/// use rowforge_sqlite::DatabaseConfig;
///
/// let config = DatabaseConfig::from_yaml_str("bind_mode: parameters\ncreate_tables: true\n").unwrap();
/// assert_eq!(config.bind_mode, BindMode::Parameters);
/// assert!(config.create_tables);
/// assert!(config.check_schema);
/// assert!(config.path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// How scalar values reach SQLite. BLOBs are always bound.
    pub bind_mode: BindMode,
    /// Compare an existing table's stored DDL with the record's on
    /// [`ensure_table`](crate::Database::ensure_table).
    pub check_schema: bool,
    /// Run `ensure_table` whenever [`table`](crate::Database::table) is
    /// called.
    pub create_tables: bool,
    /// Enable `PRAGMA foreign_keys` at open.
    pub foreign_keys: bool,
    /// How long to wait on a locked database before failing.
    pub busy_timeout_ms: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            bind_mode: BindMode::Inline,
            check_schema: true,
            create_tables: false,
            foreign_keys: true,
            busy_timeout_ms: None,
        }
    }
}

impl DatabaseConfig {
    /// Defaults, in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Defaults, backed by the file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SqliteError::IoError) if the file cannot be
    /// read, or [`ConfigError`](crate::SqliteError::ConfigError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn with_bind_mode(mut self, bind_mode: BindMode) -> Self {
        self.bind_mode = bind_mode;
        self
    }

    pub fn with_create_tables(mut self, create_tables: bool) -> Self {
        self.create_tables = create_tables;
        self
    }

    pub(crate) fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}
