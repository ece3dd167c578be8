//! Table definitions as SQLite stores them.
//!
//! SQLite keeps the `CREATE TABLE` text of every table in `sqlite_master`.
//! Table sync reads it back to decide whether a record's table must be
//! created and whether an existing one still matches the record.

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

/// Outcome of [`Database::ensure_table`](crate::Database::ensure_table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// The table did not exist and was created.
    Created,
    /// The table exists and its stored definition matches the record.
    Verified,
    /// The table exists; schema checking is disabled.
    Unchecked,
}

/// Returns the stored `CREATE TABLE` text for `table`, if it exists.
pub(crate) fn stored_table_sql(conn: &Connection, table: &str) -> Result<Option<String>> {
    let sql = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(sql)
}

/// Whether two table definitions are the same up to whitespace and ASCII
/// case. Quoted string literals are compared verbatim.
pub(crate) fn same_definition(stored: &str, generated: &str) -> bool {
    normalize_definition(stored) == normalize_definition(generated)
}

fn normalize_definition(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;
    let mut pending_space = false;
    for ch in sql.chars() {
        if in_literal {
            out.push(ch);
            if ch == '\'' {
                in_literal = false;
            }
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if ch == '\'' {
            in_literal = true;
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
