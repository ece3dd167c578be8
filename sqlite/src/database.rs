//! The rusqlite-backed [`Client`].

use rowforge_core::{
    Client, Cursor, Parameter, Record, SchemaRegistry, Statement, Table, TableSchema,
    create_table_sql, drop_table_sql,
};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::cursor::SqliteCursor;
use crate::convert::to_sql;
use crate::error::{Result, SqliteError};
use crate::schema::{TableStatus, same_definition, stored_table_sql};

/// A SQLite connection plus the schema registry for the records stored in it.
///
/// # Examples
///
/// ```
/// use rowforge_core::{Expr, Record, TableBuilder};
/// use rowforge_sqlite::{Database, DatabaseConfig};
///
/// #[derive(Debug, Default)]
/// struct Note {
///     id: i64,
///     body: String,
/// }
///
/// impl Record for Note {
///     fn describe(table: &mut TableBuilder<Self>) {
///         table.name("notes");
///         table.column("id", |n| &n.id, |n| &mut n.id).primary_key().autoincrement();
///         table.column("body", |n| &n.body, |n| &mut n.body).not_null();
///     }
/// }
///
/// let db = Database::open(DatabaseConfig::in_memory().with_create_tables(true)).unwrap();
/// let notes = db.table::<Note>().unwrap();
/// notes.insert(&Note { id: 0, body: "hello".into() }).unwrap().execute().unwrap();
///
/// let found = notes
///     .select_all()
///     .filter(Expr::col("body").eq("hello"))
///     .unwrap()
///     .fetch_all()
///     .unwrap();
/// assert_eq!(found[0].id, 1);
/// ```
pub struct Database {
    conn: Connection,
    registry: SchemaRegistry,
    config: DatabaseConfig,
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::DatabaseError`] if the file cannot be opened or
    /// a connection pragma fails.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Self::from_connection(conn, config)
    }

    /// In-memory database with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(DatabaseConfig::in_memory())
    }

    /// Wraps an existing connection, applying the connection settings of
    /// `config`. `config.path` is ignored.
    pub fn from_connection(conn: Connection, config: DatabaseConfig) -> Result<Self> {
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        if let Some(timeout) = config.busy_timeout() {
            conn.busy_timeout(timeout)?;
        }
        debug!(path = ?config.path, bind_mode = ?config.bind_mode, "Opened database");
        Ok(Self {
            conn,
            registry: SchemaRegistry::new(),
            config,
        })
    }

    /// Command entry point for `T`'s table.
    ///
    /// Registers `T` on first use. With `create_tables` set, also runs
    /// [`ensure_table`](Self::ensure_table).
    pub fn table<T: Record>(&self) -> Result<Table<'_, T, Self>> {
        let schema = self.registry.get_or_build::<T>()?;
        if self.config.create_tables {
            self.sync(&schema)?;
        }
        Ok(Table::new(self, schema).with_bind_mode(self.config.bind_mode))
    }

    /// Creates `T`'s table if it is missing; otherwise verifies the stored
    /// definition when `check_schema` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::SchemaMismatch`] when the existing table was
    /// created from a different declaration.
    pub fn ensure_table<T: Record>(&self) -> Result<TableStatus> {
        let schema = self.registry.get_or_build::<T>()?;
        self.sync(&schema)
    }

    /// Drops `T`'s table if it exists.
    pub fn drop_table<T: Record>(&self) -> Result<()> {
        let schema = self.registry.get_or_build::<T>()?;
        self.execute(&Statement::new(drop_table_sql(&schema)))?;
        info!(table = schema.table_name(), "Dropped table");
        Ok(())
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn sync<T>(&self, schema: &TableSchema<T>) -> Result<TableStatus> {
        let table = schema.table_name();
        let expected = create_table_sql(schema)?;

        let Some(found) = stored_table_sql(&self.conn, table)? else {
            self.execute(&Statement::new(expected))?;
            info!(table, "Created table");
            return Ok(TableStatus::Created);
        };

        if !self.config.check_schema {
            return Ok(TableStatus::Unchecked);
        }
        if same_definition(&found, &expected) {
            debug!(table, "Verified table definition");
            return Ok(TableStatus::Verified);
        }

        warn!(table, %expected, %found, "Table definition differs from record schema");
        Err(SqliteError::SchemaMismatch {
            table: table.to_string(),
            expected,
            found,
        })
    }

    fn prepare(&self, statement: &Statement) -> Result<rusqlite::Statement<'_>> {
        debug!(
            sql = %statement.sql,
            params = ?statement.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "Executing statement"
        );
        let mut prepared = self.conn.prepare(&statement.sql)?;
        bind(&mut prepared, &statement.params)?;
        Ok(prepared)
    }
}

fn bind(prepared: &mut rusqlite::Statement<'_>, params: &[Parameter]) -> Result<()> {
    for param in params {
        let index = prepared
            .parameter_index(&param.name)?
            .ok_or_else(|| SqliteError::UnboundParameter(param.name.clone()))?;
        prepared.raw_bind_parameter(index, to_sql(&param.value))?;
    }
    Ok(())
}

impl Client for Database {
    type Error = SqliteError;

    fn execute(&self, statement: &Statement) -> Result<usize> {
        let mut prepared = self.prepare(statement)?;
        Ok(prepared.raw_execute()?)
    }

    fn execute_reader<R, F>(&self, statement: &Statement, read: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Cursor<Error = SqliteError>) -> Result<R>,
    {
        let mut prepared = self.prepare(statement)?;
        let names = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut cursor = SqliteCursor::new(names, prepared.raw_query());
        read(&mut cursor)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
