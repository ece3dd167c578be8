//! [`Cursor`] over a running rusqlite query.

use rowforge_core::{Cursor, Value};
use rusqlite::Rows;

use crate::convert::from_sql;
use crate::error::{Result, SqliteError};

/// Owns the column names of a prepared statement and steps its rows.
pub struct SqliteCursor<'stmt> {
    names: Vec<String>,
    rows: Rows<'stmt>,
}

impl<'stmt> SqliteCursor<'stmt> {
    pub(crate) fn new(names: Vec<String>, rows: Rows<'stmt>) -> Self {
        Self { names, rows }
    }
}

impl Cursor for SqliteCursor<'_> {
    type Error = SqliteError;

    fn column_names(&self) -> &[String] {
        &self.names
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(row) = self.rows.next()? else {
            return Ok(None);
        };
        (0..self.names.len())
            .map(|index| from_sql(row.get_ref(index)?))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}
