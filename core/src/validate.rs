//! Table declaration validation.
//!
//! Catches declarations SQLite would reject (or silently misread) before any
//! statement is built: bad identifiers, duplicate columns, conflicting key
//! constraints and defaults or checks that cannot be rendered.
//!
//! # Examples
//!
//! ```
//! use rowforge_core::{Record, SchemaError, TableBuilder, TableSchema};
//!
//! #[derive(Debug, Default)]
//! struct Note {
//!     id: i64,
//!     body: String,
//! }
//!
//! impl Record for Note {
//!     fn describe(table: &mut TableBuilder<Self>) {
//!         table.name("notes");
//!         table.column("id", |n| &n.id, |n| &mut n.id);
//!         // AUTOINCREMENT is only valid on an INTEGER PRIMARY KEY
//!         table.column("body", |n| &n.body, |n| &mut n.body).autoincrement();
//!     }
//! }
//!
//! let err = TableSchema::<Note>::build().unwrap_err();
//! assert!(matches!(err, SchemaError::InvalidConstraint { .. }));
//! ```

use std::collections::HashSet;

use crate::codec::render_literal;
use crate::compile::compile;
use crate::error::{Error, SchemaError};
use crate::types::{Constraint, SqlType, TableSchema};

/// SQLite keywords (sorted), rejected as identifiers since names are
/// rendered unquoted.
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Checks that a name is a plain SQL identifier: ASCII letters, digits and
/// underscores, not starting with a digit, and not an SQLite keyword in any
/// case.
///
/// # Examples
///
/// ```
/// use rowforge_core::validate_identifier;
///
/// assert!(validate_identifier("user_accounts").is_ok());
/// assert!(validate_identifier("2fast").is_err());
/// assert!(validate_identifier("name; DROP TABLE users").is_err());
/// assert!(validate_identifier("order").is_err());
/// assert!(validate_identifier("orders").is_ok());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid && !is_keyword(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}

fn is_keyword(name: &str) -> bool {
    SQLITE_KEYWORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Validates a built table declaration, returning every problem found in
/// declaration order.
pub fn validate_table<T>(schema: &TableSchema<T>) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let table = schema.table_name();

    if let Err(err) = validate_identifier(table) {
        errors.push(err);
        return errors;
    }

    if schema.columns().is_empty() {
        errors.push(SchemaError::NoColumns(table.to_string()));
        return errors;
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut primary_keys = 0usize;

    for column in schema.columns() {
        let name = column.name();
        if let Err(err) = validate_identifier(name) {
            errors.push(err);
            continue;
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: name.to_string(),
            });
            continue;
        }

        let invalid = |reason: &str| SchemaError::InvalidConstraint {
            table: table.to_string(),
            column: name.to_string(),
            reason: reason.to_string(),
        };

        let column_schema = column.schema();
        if column_schema.is_primary_key() {
            primary_keys += 1;
            if primary_keys > 1 {
                errors.push(invalid("table already has a PRIMARY KEY"));
            }
        }

        // constraints render in declaration order, so the pair must be adjacent
        if column_schema.is_autoincrement()
            && !(column.sql_type() == SqlType::Integer
                && column_schema
                    .constraints()
                    .windows(2)
                    .any(|pair| pair == [Constraint::PrimaryKey, Constraint::Autoincrement]))
        {
            errors.push(invalid("AUTOINCREMENT requires an INTEGER PRIMARY KEY"));
        }

        for constraint in column_schema.constraints() {
            match constraint {
                Constraint::Default(value) => {
                    if let Err(err) = render_literal(value) {
                        errors.push(invalid(&format!("DEFAULT {err}")));
                    }
                }
                Constraint::Check(predicate) => {
                    if predicate.has_aggregate() {
                        errors.push(invalid("CHECK cannot contain aggregates"));
                        continue;
                    }
                    match compile(schema, predicate) {
                        Ok(_) => {}
                        Err(Error::Schema(err)) => errors.push(err),
                        Err(err) => errors.push(invalid(&format!("CHECK {err}"))),
                    }
                }
                _ => {}
            }
        }
    }

    errors
}
