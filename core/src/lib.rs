//! Schema-driven SQL building for SQLite record types.
//!
//! This crate holds everything between a plain Rust record and the text a
//! database client executes:
//!
//! - [`Record`] / [`TableBuilder`]: a record's statically declared table
//!   layout, built once into a [`TableSchema`] and cached by the
//!   [`SchemaRegistry`].
//! - [`Value`] / [`FieldType`]: the native-type to SQL-type table and the
//!   per-type conversions; [`encode`] renders a value for a column and
//!   [`Blob`] stores any serde type as a framed CBOR payload.
//! - [`Expr`] / [`compile`]: predicate trees and their SQLite rendering.
//! - [`Table`] / [`Command`]: the staged builder; each clause returns the
//!   command typed to its next [`stage`], so illegal clause orders do not
//!   compile.
//! - [`Rows`]: lazy materialization of cursor rows back into records.
//! - [`Client`] / [`Cursor`]: the seam a database driver implements.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rowforge_core::*;
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
//! let registry = SchemaRegistry::new();
//! let client = DryRun::new();
//! let users = Table::new(&client, registry.get_or_build::<User>().unwrap());
//!
//! let adults = users
//!     .select(&["name"])
//!     .unwrap()
//!     .filter(Expr::col("age").ge(18))
//!     .unwrap()
//!     .order_by(&["name"], Direction::Asc)
//!     .unwrap();
//! assert_eq!(adults.sql(), "SELECT name FROM users WHERE age >= 18 ORDER BY name ASC");
//! ```

mod client;
mod codec;
mod command;
mod compile;
mod ddl;
mod error;
mod expr;
mod registry;
mod rows;
mod types;
mod validate;
mod value;

pub use client::{Client, Cursor, DryRun, Parameter, Statement};
pub use codec::{
    BindMode, Encoded, deserialize_blob, encode, placeholder, quote_text, render_literal,
    serialize_blob,
};
pub use command::{Command, Direction, Table, stage};
pub use compile::{compile, compile_bound};
pub use ddl::{create_table_sql, drop_table_sql};
pub use error::{CodecError, CompileError, Error, Result, SchemaError};
pub use expr::{Aggregate, BinaryOp, Expr, UnaryOp};
pub use registry::SchemaRegistry;
pub use rows::Rows;
pub use types::{
    Column, ColumnBuilder, ColumnSchema, Constraint, Record, SqlType, TableBuilder, TableSchema,
};
pub use validate::{validate_identifier, validate_table};
pub use value::{Blob, FieldType, Value};
