//! SQLite client for rowforge records.
//!
//! [`Database`] owns a rusqlite [`Connection`](rusqlite::Connection) and a
//! [`SchemaRegistry`](rowforge_core::SchemaRegistry), and implements the core
//! [`Client`](rowforge_core::Client) seam: it binds each statement's named
//! parameters, runs it, and streams result rows through a cursor.
//!
//! # Architecture
//!
//! - **`database`**: connection setup, the `Client` impl and table sync
//! - **`config`**: YAML-loadable [`DatabaseConfig`]
//! - **`schema`**: `sqlite_master` lookups behind [`Database::ensure_table`]
//! - **`cursor`** / **`convert`**: rusqlite rows and values to core values
//!
//! # Quick start
//!
//! ```no_run
//! use rowforge_core::{Direction, Expr, Record, TableBuilder};
//! use rowforge_sqlite::{Database, DatabaseConfig};
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
//!         table.column("name", |u| &u.name, |u| &mut u.name).not_null();
//!         table.column("age", |u| &u.age, |u| &mut u.age);
//!     }
//! }
//!
//! let config = DatabaseConfig::load("rowforge.yml").unwrap();
//! let db = Database::open(config).unwrap();
//! db.ensure_table::<User>().unwrap();
//!
//! let users = db.table::<User>().unwrap();
//! for user in users
//!     .select_all()
//!     .filter(Expr::col("age").ge(18))
//!     .unwrap()
//!     .order_by(&["name"], Direction::Asc)
//!     .unwrap()
//!     .fetch_all()
//!     .unwrap()
//! {
//!     println!("{} is {}", user.name, user.age);
//! }
//! ```

mod config;
mod convert;
mod cursor;
mod database;
mod error;
mod schema;

pub use config::DatabaseConfig;
pub use cursor::SqliteCursor;
pub use database::Database;
pub use error::{Result, SqliteError};
pub use schema::TableStatus;
