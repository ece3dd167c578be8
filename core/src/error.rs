//! Error types for schema registration, value marshalling and predicate
//! compilation.
//!
//! Every error here is raised synchronously at the point of misuse and is
//! never retried: each one points at a bad record declaration, a bad field
//! list or a bad predicate in the calling code.

use thiserror::Error;

/// Problems with a record's declared table layout or with a field list
/// handed to a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The record's `describe` never called [`TableBuilder::name`](crate::TableBuilder::name).
    #[error("record type {0} has no table name")]
    MissingTableName(&'static str),

    /// The record declares no columns at all.
    #[error("table {0} declares no columns")]
    NoColumns(String),

    /// A table or column name is not a plain SQL identifier, or is an
    /// SQLite keyword.
    #[error(
        "invalid identifier '{0}': must start with a letter or underscore, contain only alphanumeric characters and underscores, and not be an SQLite keyword"
    )]
    InvalidIdentifier(String),

    /// Two columns (or two entries of a field list) share a name.
    #[error("duplicate column in table {table}: {column}")]
    DuplicateColumn { table: String, column: String },

    /// A field name does not map to any declared column.
    #[error("unmapped field '{field}' on table {table}")]
    UnmappedField { table: String, field: String },

    /// An explicit insert/update targets a database-generated column.
    #[error("immutable column '{column}' on table {table} cannot be assigned")]
    ImmutableColumn { table: String, column: String },

    /// A constraint declaration SQLite would reject.
    #[error("invalid constraint on {table}.{column}: {reason}")]
    InvalidConstraint {
        table: String,
        column: String,
        reason: String,
    },

    /// A projection, grouping, ordering or subset list was empty.
    #[error("empty field list for table {0}")]
    EmptyFieldList(String),
}

/// Failures converting between native field values and SQL values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// BLOB payload could not be serialized.
    #[error("serialize failure: {0}")]
    Serialize(String),

    /// BLOB payload is corrupt or does not match the target type.
    #[error("deserialize failure: {0}")]
    Deserialize(String),

    /// A cell's storage class does not convert to the field type.
    #[error("type conversion failure: expected {expected}, found {found}")]
    TypeConversion {
        expected: &'static str,
        found: &'static str,
    },

    /// The value exists but does not fit the target type.
    #[error("value out of range for {target}: {value}")]
    OutOfRange { target: &'static str, value: String },

    /// The value has no SQL rendering (NaN, infinities, non-numeric text
    /// in a numeric column).
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Predicate shapes the compiler cannot translate to SQLite syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The operator has no SQLite counterpart.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(&'static str),

    /// Predicate constants must be scalar.
    #[error("unsupported literal in predicate: {0}")]
    UnsupportedLiteral(&'static str),
}

/// Umbrella error for everything the core raises.
#[derive(Debug, Error)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// A cell read from a cursor could not be assigned to its field.
    #[error("failed to decode column {column}: {source}")]
    Decode {
        column: String,
        #[source]
        source: CodecError,
    },
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
