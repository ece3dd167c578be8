//! Error types for the SQLite client.
//!
//! Driver failures are wrapped unchanged; everything the core raises while
//! building or materializing arrives through [`SqliteError::Core`].

use rowforge_core::{CodecError, CompileError, SchemaError};
use thiserror::Error;

/// Errors that can occur while running commands against SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite rejected or failed a statement.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Schema, codec, compile or decode failure from the builder.
    #[error(transparent)]
    Core(#[from] rowforge_core::Error),

    /// The table exists with a definition that differs from the record's.
    #[error("schema mismatch for table {table}: expected `{expected}`, found `{found}`")]
    SchemaMismatch {
        table: String,
        expected: String,
        found: String,
    },

    /// A statement parameter has no matching placeholder in its SQL.
    #[error("unbound parameter: {0}")]
    UnboundParameter(String),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<SchemaError> for SqliteError {
    fn from(err: SchemaError) -> Self {
        SqliteError::Core(err.into())
    }
}

impl From<CodecError> for SqliteError {
    fn from(err: CodecError) -> Self {
        SqliteError::Core(err.into())
    }
}

impl From<CompileError> for SqliteError {
    fn from(err: CompileError) -> Self {
        SqliteError::Core(err.into())
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
