//! The seam between command building and a database driver.
//!
//! The core never executes SQL itself. A [`Client`] receives finished
//! [`Statement`]s, binds their [`Parameter`]s and hands result rows back
//! through a [`Cursor`]. `rowforge-sqlite` provides the rusqlite-backed
//! implementation; [`DryRun`] records statements without a database.

use std::cell::RefCell;
use std::fmt;

use crate::error::Error;
use crate::value::Value;

/// A named value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Placeholder name including its prefix (`@data`, `:p1`).
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Finished command text plus the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Parameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Parameter>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Forward-only view over a result set.
pub trait Cursor {
    type Error;

    /// Column names as reported by the driver, in result order.
    fn column_names(&self) -> &[String];

    /// Advances to the next row; `Ok(None)` at end of results.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>, Self::Error>;
}

/// Executes statements on behalf of command builders.
///
/// Errors raised by the driver are returned unchanged; core errors met while
/// building or materializing convert into `Self::Error`.
pub trait Client {
    type Error: std::error::Error + From<Error>;

    /// Runs a statement that returns no rows; yields the affected row count.
    fn execute(&self, statement: &Statement) -> Result<usize, Self::Error>;

    /// Runs a query and lends its cursor to `read` for the duration of the
    /// call.
    fn execute_reader<R, F>(&self, statement: &Statement, read: F) -> Result<R, Self::Error>
    where
        F: FnOnce(&mut dyn Cursor<Error = Self::Error>) -> Result<R, Self::Error>;

    /// First column of the first row, or `Value::Null` for an empty result.
    fn execute_scalar(&self, statement: &Statement) -> Result<Value, Self::Error> {
        self.execute_reader(statement, |cursor| {
            Ok(cursor
                .next_row()?
                .and_then(|row| row.into_iter().next())
                .unwrap_or(Value::Null))
        })
    }
}

/// A client that records every statement and returns no rows.
///
/// ```
/// use rowforge_core::{Client, DryRun, Statement};
///
/// let client = DryRun::new();
/// assert_eq!(client.execute(&Statement::new("DELETE FROM users")).unwrap(), 0);
/// assert_eq!(client.last_sql().as_deref(), Some("DELETE FROM users"));
/// ```
#[derive(Debug, Default)]
pub struct DryRun {
    recorded: RefCell<Vec<Statement>>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement seen so far, oldest first.
    pub fn statements(&self) -> Vec<Statement> {
        self.recorded.borrow().clone()
    }

    pub fn last_sql(&self) -> Option<String> {
        self.recorded.borrow().last().map(|s| s.sql.clone())
    }

    fn record(&self, statement: &Statement) {
        self.recorded.borrow_mut().push(statement.clone());
    }
}

struct Exhausted;

impl Cursor for Exhausted {
    type Error = Error;

    fn column_names(&self) -> &[String] {
        &[]
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, Error> {
        Ok(None)
    }
}

impl Client for DryRun {
    type Error = Error;

    fn execute(&self, statement: &Statement) -> Result<usize, Error> {
        self.record(statement);
        Ok(0)
    }

    fn execute_reader<R, F>(&self, statement: &Statement, read: F) -> Result<R, Error>
    where
        F: FnOnce(&mut dyn Cursor<Error = Error>) -> Result<R, Error>,
    {
        self.record(statement);
        read(&mut Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_records_in_order() {
        let client = DryRun::new();
        client.execute(&Statement::new("DELETE FROM a")).unwrap();
        let scalar = client.execute_scalar(&Statement::new("SELECT COUNT(*) FROM a")).unwrap();
        assert_eq!(scalar, Value::Null);

        let sql: Vec<_> = client.statements().into_iter().map(|s| s.sql).collect();
        assert_eq!(sql, vec!["DELETE FROM a", "SELECT COUNT(*) FROM a"]);
    }

    #[test]
    fn test_dry_run_reader_is_empty() {
        let client = DryRun::new();
        let rows = client
            .execute_reader(&Statement::new("SELECT * FROM a"), |cursor| {
                assert!(cursor.column_names().is_empty());
                let mut count = 0;
                while cursor.next_row()?.is_some() {
                    count += 1;
                }
                Ok(count)
            })
            .unwrap();
        assert_eq!(rows, 0);
    }
}
