//! Staged SQL command builder.
//!
//! [`Table`] is the entry point for one record type. Each clause method
//! consumes the command, appends its clause and returns the command typed to
//! the next [`stage`]; the stage decides which clauses and which way of
//! running are available.
//!
//! ```
//! use std::sync::Arc;
//! use rowforge_core::{Direction, DryRun, Expr, Record, Table, TableBuilder, TableSchema};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for User {
//!     fn describe(table: &mut TableBuilder<Self>) {
//!         table.name("users");
//!         table.column("id", |u| &u.id, |u| &mut u.id).primary_key().autoincrement();
//!         table.column("name", |u| &u.name, |u| &mut u.name);
//!         table.column("age", |u| &u.age, |u| &mut u.age);
//!     }
//! }
//!
//! let client = DryRun::new();
//! let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//!
//! let ann = User { id: 0, name: "Ann".into(), age: 30 };
//! assert_eq!(
//!     users.insert(&ann).unwrap().sql(),
//!     "INSERT INTO users (name, age) VALUES ('Ann', 30)"
//! );
//!
//! let page = users
//!     .select_all()
//!     .filter(Expr::col("age").gt(18).and(Expr::col("age").le(65)))
//!     .unwrap()
//!     .order_by(&["name"], Direction::Asc)
//!     .unwrap()
//!     .limit(10);
//! assert_eq!(
//!     page.sql(),
//!     "SELECT * FROM users WHERE (age > 18) AND (age <= 65) ORDER BY name ASC LIMIT 10"
//! );
//! ```

pub mod stage;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::client::{Client, Parameter, Statement};
use crate::codec::{BindMode, encode};
use crate::compile::{compile, compile_bound};
use crate::error::{Error, Result, SchemaError};
use crate::expr::Expr;
use crate::rows::Rows;
use crate::types::{Column, Record, TableSchema};
use crate::value::FieldType;

use stage::{Filterable, Groupable, Limitable, NonQuery, Orderable, Query, Scalar, Stage};

const SELECT: &str = "SELECT ";

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for building commands against one table.
pub struct Table<'c, T, C> {
    client: &'c C,
    schema: Arc<TableSchema<T>>,
    bind_mode: BindMode,
}

impl<'c, T: Record, C> Table<'c, T, C> {
    pub fn new(client: &'c C, schema: Arc<TableSchema<T>>) -> Self {
        Self {
            client,
            schema,
            bind_mode: BindMode::default(),
        }
    }

    pub fn with_bind_mode(mut self, bind_mode: BindMode) -> Self {
        self.bind_mode = bind_mode;
        self
    }

    pub fn schema(&self) -> &Arc<TableSchema<T>> {
        &self.schema
    }

    pub fn bind_mode(&self) -> BindMode {
        self.bind_mode
    }

    /// `INSERT INTO t (...) VALUES (...)` over every non-autoincrement column.
    pub fn insert(&self, row: &T) -> Result<Command<'c, T, C, stage::Insert>> {
        self.insert_with("INSERT", row, None)
    }

    /// Inserts only the named fields.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ImmutableColumn`] if a field is autoincrement, plus the
    /// field-list errors of [`TableSchema::resolve`].
    pub fn insert_fields(&self, row: &T, fields: &[&str]) -> Result<Command<'c, T, C, stage::Insert>> {
        self.insert_with("INSERT", row, Some(fields))
    }

    /// `REPLACE INTO …`; otherwise identical to [`insert`](Self::insert).
    pub fn insert_or_replace(&self, row: &T) -> Result<Command<'c, T, C, stage::Insert>> {
        self.insert_with("REPLACE", row, None)
    }

    pub fn insert_or_replace_fields(
        &self,
        row: &T,
        fields: &[&str],
    ) -> Result<Command<'c, T, C, stage::Insert>> {
        self.insert_with("REPLACE", row, Some(fields))
    }

    /// `SELECT * FROM t`
    pub fn select_all(&self) -> Command<'c, T, C, stage::Select> {
        self.start(format!("{SELECT}* FROM {}", self.schema.table_name()))
    }

    /// `SELECT a, b FROM t`, columns in the order given.
    pub fn select(&self, fields: &[&str]) -> Result<Command<'c, T, C, stage::Select>> {
        let columns = self.schema.resolve(fields)?;
        Ok(self.start(format!(
            "{SELECT}{} FROM {}",
            column_list(&columns),
            self.schema.table_name()
        )))
    }

    /// `SELECT COUNT(*) FROM t`; read the result with
    /// [`scalar`](Command::scalar). Only a `WHERE` clause may follow.
    pub fn count(&self) -> Command<'c, T, C, stage::Count> {
        self.start(format!("{SELECT}COUNT(*) FROM {}", self.schema.table_name()))
    }

    /// `UPDATE t SET ...` over every non-autoincrement column.
    pub fn update(&self, row: &T) -> Result<Command<'c, T, C, stage::Update>> {
        self.update_with(row, None)
    }

    /// Updates only the named fields.
    pub fn update_fields(&self, row: &T, fields: &[&str]) -> Result<Command<'c, T, C, stage::Update>> {
        self.update_with(row, Some(fields))
    }

    /// `DELETE FROM t`
    pub fn delete(&self) -> Command<'c, T, C, stage::Delete> {
        self.start(format!("DELETE FROM {}", self.schema.table_name()))
    }

    fn insert_with(
        &self,
        keyword: &str,
        row: &T,
        fields: Option<&[&str]>,
    ) -> Result<Command<'c, T, C, stage::Insert>> {
        let table = self.schema.table_name();
        let columns = self.schema.writable(fields)?;
        if columns.is_empty() {
            return Ok(self.start(format!("{keyword} INTO {table} DEFAULT VALUES")));
        }

        let mut params = Vec::new();
        let values = columns
            .iter()
            .map(|column| self.encode_column(column, row, &mut params))
            .collect::<Result<Vec<_>>>()?;

        let mut command = self.start(format!(
            "{keyword} INTO {table} ({}) VALUES ({})",
            column_list(&columns),
            values.join(", ")
        ));
        command.params = params;
        Ok(command)
    }

    fn update_with(&self, row: &T, fields: Option<&[&str]>) -> Result<Command<'c, T, C, stage::Update>> {
        let table = self.schema.table_name();
        let columns = self.schema.writable(fields)?;
        if columns.is_empty() {
            return Err(SchemaError::EmptyFieldList(table.to_string()).into());
        }

        let mut params = Vec::new();
        let assignments = columns
            .iter()
            .map(|column| {
                let value = self.encode_column(column, row, &mut params)?;
                Ok(format!("{} = {value}", column.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut command = self.start(format!("UPDATE {table} SET {}", assignments.join(", ")));
        command.params = params;
        Ok(command)
    }

    fn encode_column(&self, column: &Column<T>, row: &T, params: &mut Vec<Parameter>) -> Result<String> {
        let encoded = encode(column.schema(), column.read(row)?, self.bind_mode)?;
        if let Some(value) = encoded.param {
            params.push(Parameter::new(encoded.sql.clone(), value));
        }
        Ok(encoded.sql)
    }

    fn start<S: Stage>(&self, sql: String) -> Command<'c, T, C, S> {
        Command {
            client: self.client,
            schema: Arc::clone(&self.schema),
            bind_mode: self.bind_mode,
            sql,
            params: Vec::new(),
            stage: PhantomData,
        }
    }
}

impl<T, C> fmt::Debug for Table<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("table", &self.schema.table_name())
            .field("bind_mode", &self.bind_mode)
            .finish_non_exhaustive()
    }
}

fn column_list<T>(columns: &[&Column<T>]) -> String {
    columns
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A command under construction, typed by its current [`stage`].
pub struct Command<'c, T, C, S> {
    client: &'c C,
    schema: Arc<TableSchema<T>>,
    bind_mode: BindMode,
    sql: String,
    params: Vec<Parameter>,
    stage: PhantomData<S>,
}

impl<'c, T, C, S: Stage> Command<'c, T, C, S> {
    /// Command text accumulated so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters the command text references.
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn statement(&self) -> Statement {
        Statement::with_params(self.sql.clone(), self.params.clone())
    }

    pub fn into_statement(self) -> Statement {
        Statement::with_params(self.sql, self.params)
    }

    fn advance<N: Stage>(self) -> Command<'c, T, C, N> {
        Command {
            client: self.client,
            schema: self.schema,
            bind_mode: self.bind_mode,
            sql: self.sql,
            params: self.params,
            stage: PhantomData,
        }
    }

    fn clause(mut self, keyword: &str, predicate: &Expr) -> Result<Self> {
        let text = match self.bind_mode {
            BindMode::Inline => compile(&self.schema, predicate)?,
            BindMode::Parameters => compile_bound(&self.schema, predicate, &mut self.params)?,
        };
        self.sql.push(' ');
        self.sql.push_str(keyword);
        self.sql.push(' ');
        self.sql.push_str(&text);
        Ok(self)
    }

    fn column_clause(mut self, keyword: &str, fields: &[&str]) -> Result<Self> {
        let columns = self.schema.resolve(fields)?;
        let list = column_list(&columns);
        self.sql.push(' ');
        self.sql.push_str(keyword);
        self.sql.push(' ');
        self.sql.push_str(&list);
        Ok(self)
    }
}

impl<'c, T, C, S: Filterable> Command<'c, T, C, S> {
    /// Appends `WHERE <predicate>`.
    pub fn filter(self, predicate: Expr) -> Result<Command<'c, T, C, S::Next>> {
        Ok(self.clause("WHERE", &predicate)?.advance())
    }
}

impl<'c, T, C> Command<'c, T, C, stage::Select> {
    /// Turns the projection into `SELECT DISTINCT …`.
    pub fn distinct(mut self) -> Command<'c, T, C, stage::Distinct> {
        self.sql.insert_str(SELECT.len(), "DISTINCT ");
        self.advance()
    }
}

impl<'c, T, C, S: Groupable> Command<'c, T, C, S> {
    /// Appends `GROUP BY <cols>`.
    pub fn group_by(self, fields: &[&str]) -> Result<Command<'c, T, C, stage::GroupBy>> {
        Ok(self.column_clause("GROUP BY", fields)?.advance())
    }
}

impl<'c, T, C> Command<'c, T, C, stage::GroupBy> {
    /// Appends `HAVING <predicate>`; aggregates are allowed here.
    pub fn having(self, predicate: Expr) -> Result<Command<'c, T, C, stage::Having>> {
        Ok(self.clause("HAVING", &predicate)?.advance())
    }
}

impl<'c, T, C, S: Orderable> Command<'c, T, C, S> {
    /// Appends `ORDER BY <cols> ASC|DESC`.
    pub fn order_by(
        self,
        fields: &[&str],
        direction: Direction,
    ) -> Result<Command<'c, T, C, stage::OrderBy>> {
        let mut command = self.column_clause("ORDER BY", fields)?;
        command.sql.push(' ');
        command.sql.push_str(direction.as_str());
        Ok(command.advance())
    }
}

impl<'c, T, C, S: Limitable> Command<'c, T, C, S> {
    /// Appends `LIMIT <count>`.
    pub fn limit(self, count: u64) -> Command<'c, T, C, stage::Limit> {
        self.limit_offset(count, 0)
    }

    /// Appends `LIMIT <count> OFFSET <offset>`; a zero offset is omitted.
    pub fn limit_offset(mut self, count: u64, offset: u64) -> Command<'c, T, C, stage::Limit> {
        self.sql.push_str(&format!(" LIMIT {count}"));
        if offset > 0 {
            self.sql.push_str(&format!(" OFFSET {offset}"));
        }
        self.advance()
    }
}

impl<T: Record, C: Client, S: Query> Command<'_, T, C, S> {
    /// Runs the query and lends the lazily materialized rows to `read`.
    ///
    /// The rows borrow the client's cursor, so they cannot outlive the call.
    pub fn with_rows<R, F>(self, read: F) -> std::result::Result<R, C::Error>
    where
        F: FnOnce(Rows<'_, T, C::Error>) -> std::result::Result<R, C::Error>,
    {
        let schema = Arc::clone(&self.schema);
        let client = self.client;
        let statement = self.into_statement();
        client.execute_reader(&statement, |cursor| read(Rows::new(cursor, &schema)))
    }

    /// Runs the query and collects every row.
    pub fn fetch_all(self) -> std::result::Result<Vec<T>, C::Error> {
        self.with_rows(|rows| rows.collect())
    }

}

impl<T: Record, C: Client, S: Scalar> Command<'_, T, C, S> {
    /// Runs the query and decodes the first column of the first row.
    ///
    /// An empty result decodes from `NULL`, so use an `Option` target when
    /// the query may match nothing.
    pub fn scalar<F: FieldType>(self) -> std::result::Result<F, C::Error> {
        let value = self.client.execute_scalar(&self.statement())?;
        F::from_value(value).map_err(|source| Error::from(source).into())
    }
}

impl<T, C: Client, S: NonQuery> Command<'_, T, C, S> {
    /// Runs the statement, returning the affected row count.
    pub fn execute(self) -> std::result::Result<usize, C::Error> {
        self.client.execute(&self.statement())
    }
}

impl<T, C, S> fmt::Debug for Command<'_, T, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("stage", &std::any::type_name::<S>())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
