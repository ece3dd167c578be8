//! Table and column schema types.
//!
//! A record type declares its table layout once, through
//! [`Record::describe`]. The declaration is a static column-descriptor table:
//! each entry names a field, the accessors that reach it, and its
//! constraints. [`SqlType`] comes from the field's [`FieldType`] impl, so the
//! type mapping is fixed at compile time.
//!
//! # Examples
//!
//! ```
//! use rowforge_core::{Expr, Record, SqlType, TableBuilder, TableSchema};
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
//!         table
//!             .column("age", |u| &u.age, |u| &mut u.age)
//!             .check(Expr::col("age").ge(0));
//!     }
//! }
//!
//! let schema = TableSchema::<User>::build().unwrap();
//! assert_eq!(schema.table_name(), "users");
//! assert_eq!(schema.column("age").unwrap().sql_type(), SqlType::Integer);
//! assert!(schema.column("id").unwrap().is_autoincrement());
//! ```

use std::fmt;

use crate::error::{CodecError, SchemaError};
use crate::expr::Expr;
use crate::validate::validate_table;
use crate::value::{FieldType, Value};

/// Column type, one per SQLite type affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Integer,
    Real,
    Numeric,
    Text,
    Blob,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column constraint, rendered in declaration order by the DDL generator.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    PrimaryKey,
    Unique,
    NotNull,
    Default(Value),
    Check(Expr),
    Autoincrement,
}

/// Metadata for one column: its SQL name, the record field it maps, its type
/// and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    name: String,
    field: &'static str,
    sql_type: SqlType,
    constraints: Vec<Constraint>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, field: &'static str, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            field,
            sql_type,
            constraints: Vec::new(),
        }
    }

    /// SQL column name (the field name unless renamed).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record field identifier this column maps.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints.contains(&Constraint::PrimaryKey)
    }

    /// Autoincrement columns are generated by the database and can never be
    /// assigned by an insert or update.
    pub fn is_autoincrement(&self) -> bool {
        self.constraints.contains(&Constraint::Autoincrement)
    }
}

type Reader<T> = Box<dyn Fn(&T) -> Result<Value, CodecError> + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, Value) -> Result<(), CodecError> + Send + Sync>;

/// A column together with typed accessors into the record.
pub struct Column<T> {
    schema: ColumnSchema,
    read: Reader<T>,
    write: Writer<T>,
}

impl<T> Column<T> {
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn field(&self) -> &'static str {
        self.schema.field()
    }

    pub fn sql_type(&self) -> SqlType {
        self.schema.sql_type()
    }

    pub fn is_autoincrement(&self) -> bool {
        self.schema.is_autoincrement()
    }

    /// Reads the field from `row` as a SQL value.
    pub fn read(&self, row: &T) -> Result<Value, CodecError> {
        (self.read)(row)
    }

    /// Decodes `cell` into the field's native type and stores it on `row`.
    pub fn assign(&self, row: &mut T, cell: Value) -> Result<(), CodecError> {
        (self.write)(row, cell)
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("schema", &self.schema).finish_non_exhaustive()
    }
}

/// A record type that maps to one table.
pub trait Record: Default + Send + Sync + 'static {
    /// Declares the table name and columns. Called once per registry.
    fn describe(table: &mut TableBuilder<Self>);
}

/// Collects a record's table declaration.
pub struct TableBuilder<T> {
    name: Option<String>,
    columns: Vec<Column<T>>,
}

impl<T: 'static> TableBuilder<T> {
    fn new() -> Self {
        Self {
            name: None,
            columns: Vec::new(),
        }
    }

    /// Sets the table name.
    pub fn name(&mut self, table: impl Into<String>) -> &mut Self {
        self.name = Some(table.into());
        self
    }

    /// Maps `field` to a column named after it. The column type comes from
    /// `F`'s [`FieldType`] impl.
    pub fn column<F>(
        &mut self,
        field: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> ColumnBuilder<'_, T>
    where
        F: FieldType + 'static,
    {
        self.columns.push(Column {
            schema: ColumnSchema::new(field, field, F::SQL_TYPE),
            read: Box::new(move |row: &T| get(row).to_value()),
            write: Box::new(move |row: &mut T, cell: Value| {
                *get_mut(row) = F::from_value(cell)?;
                Ok(())
            }),
        });
        let index = self.columns.len() - 1;
        ColumnBuilder {
            column: &mut self.columns[index],
        }
    }
}

/// Chains constraints onto the column just declared.
pub struct ColumnBuilder<'a, T> {
    column: &'a mut Column<T>,
}

impl<T> ColumnBuilder<'_, T> {
    /// Overrides the column name (defaults to the field name).
    pub fn rename(self, name: impl Into<String>) -> Self {
        self.column.schema.name = name.into();
        self
    }

    pub fn primary_key(self) -> Self {
        self.constrain(Constraint::PrimaryKey)
    }

    pub fn unique(self) -> Self {
        self.constrain(Constraint::Unique)
    }

    pub fn not_null(self) -> Self {
        self.constrain(Constraint::NotNull)
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        self.constrain(Constraint::Default(value.into()))
    }

    /// Adds a `CHECK(...)` constraint; field references resolve against this
    /// table when the schema is built.
    pub fn check(self, predicate: Expr) -> Self {
        self.constrain(Constraint::Check(predicate))
    }

    pub fn autoincrement(self) -> Self {
        self.constrain(Constraint::Autoincrement)
    }

    fn constrain(self, constraint: Constraint) -> Self {
        self.column.schema.constraints.push(constraint);
        self
    }
}

/// The registered layout of a record type's table.
///
/// Immutable once built; share it through the
/// [`SchemaRegistry`](crate::SchemaRegistry).
pub struct TableSchema<T> {
    record: &'static str,
    table_name: String,
    columns: Vec<Column<T>>,
}

impl<T: Record> TableSchema<T> {
    /// Runs the record's declaration and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingTableName`] if no table name was set, and
    /// the first problem found by [`validate_table`] otherwise.
    pub fn build() -> Result<Self, SchemaError> {
        let schema = Self::declare()?;
        if let Some(err) = validate_table(&schema).into_iter().next() {
            return Err(err);
        }
        Ok(schema)
    }

    /// Runs the declaration without validating it.
    pub(crate) fn declare() -> Result<Self, SchemaError> {
        let mut builder = TableBuilder::new();
        T::describe(&mut builder);

        let record = std::any::type_name::<T>();
        let table_name = builder.name.ok_or(SchemaError::MissingTableName(record))?;
        Ok(Self {
            record,
            table_name,
            columns: builder.columns,
        })
    }
}

impl<T> TableSchema<T> {
    /// Rust type name of the record.
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Looks up the column mapped to a record field.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnmappedField`] if the field is not mapped.
    pub fn column(&self, field: &str) -> Result<&Column<T>, SchemaError> {
        self.columns
            .iter()
            .find(|c| c.field() == field)
            .ok_or_else(|| SchemaError::UnmappedField {
                table: self.table_name.clone(),
                field: field.to_string(),
            })
    }

    /// Index of the column with the given SQL name (ASCII case-insensitive,
    /// like SQLite identifiers).
    pub fn position_of(&self, column_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(column_name))
    }

    pub fn primary_key(&self) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.schema().is_primary_key())
    }

    /// Resolves an explicit field list, preserving its order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyFieldList`] for an empty list,
    /// [`SchemaError::UnmappedField`] for unknown fields and
    /// [`SchemaError::DuplicateColumn`] when a field is named twice.
    pub fn resolve(&self, fields: &[&str]) -> Result<Vec<&Column<T>>, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyFieldList(self.table_name.clone()));
        }
        let mut resolved: Vec<&Column<T>> = Vec::with_capacity(fields.len());
        for field in fields {
            let column = self.column(field)?;
            if resolved.iter().any(|c| c.field() == column.field()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.table_name.clone(),
                    column: column.name().to_string(),
                });
            }
            resolved.push(column);
        }
        Ok(resolved)
    }

    /// Columns an insert or update may assign.
    ///
    /// Without a field list, every non-autoincrement column. With one, the
    /// resolved list, rejecting autoincrement columns.
    ///
    /// # Errors
    ///
    /// Everything [`resolve`](Self::resolve) returns, plus
    /// [`SchemaError::ImmutableColumn`].
    pub fn writable(&self, fields: Option<&[&str]>) -> Result<Vec<&Column<T>>, SchemaError> {
        let Some(fields) = fields else {
            return Ok(self.columns.iter().filter(|c| !c.is_autoincrement()).collect());
        };
        let columns = self.resolve(fields)?;
        if let Some(generated) = columns.iter().find(|c| c.is_autoincrement()) {
            return Err(SchemaError::ImmutableColumn {
                table: self.table_name.clone(),
                column: generated.name().to_string(),
            });
        }
        Ok(columns)
    }
}

impl<T> fmt::Debug for TableSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSchema")
            .field("record", &self.record)
            .field("table_name", &self.table_name)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::value::Blob;

    #[derive(Debug, Default)]
    struct Everything {
        small: u8,
        big: i64,
        ratio: f32,
        flag: bool,
        at: DateTime<Utc>,
        price: Decimal,
        label: String,
        initial: char,
        maybe: Option<f64>,
        payload: Blob<Vec<String>>,
    }

    impl Record for Everything {
        fn describe(table: &mut TableBuilder<Self>) {
            table.name("everything");
            table.column("small", |r| &r.small, |r| &mut r.small);
            table.column("big", |r| &r.big, |r| &mut r.big);
            table.column("ratio", |r| &r.ratio, |r| &mut r.ratio);
            table.column("flag", |r| &r.flag, |r| &mut r.flag);
            table.column("at", |r| &r.at, |r| &mut r.at);
            table.column("price", |r| &r.price, |r| &mut r.price);
            table.column("label", |r| &r.label, |r| &mut r.label).rename("title");
            table.column("initial", |r| &r.initial, |r| &mut r.initial);
            table.column("maybe", |r| &r.maybe, |r| &mut r.maybe);
            table.column("payload", |r| &r.payload, |r| &mut r.payload);
        }
    }

    #[test]
    fn test_type_table() {
        let schema = TableSchema::<Everything>::build().unwrap();
        let types: Vec<_> = schema.columns().iter().map(|c| c.sql_type()).collect();
        assert_eq!(
            types,
            vec![
                SqlType::Integer,
                SqlType::Integer,
                SqlType::Real,
                SqlType::Numeric,
                SqlType::Numeric,
                SqlType::Numeric,
                SqlType::Text,
                SqlType::Text,
                SqlType::Real,
                SqlType::Blob,
            ]
        );
    }

    #[test]
    fn test_rename_keeps_field_identifier() {
        let schema = TableSchema::<Everything>::build().unwrap();
        let column = schema.column("label").unwrap();
        assert_eq!(column.name(), "title");
        assert_eq!(schema.position_of("TITLE"), Some(6));
        assert!(schema.column("title").is_err());
    }

    #[test]
    fn test_accessors_read_and_assign() {
        let schema = TableSchema::<Everything>::build().unwrap();
        let mut row = Everything::default();
        schema
            .column("label")
            .unwrap()
            .assign(&mut row, Value::Text("hello".into()))
            .unwrap();
        assert_eq!(row.label, "hello");
        assert_eq!(
            schema.column("label").unwrap().read(&row).unwrap(),
            Value::Text("hello".into())
        );
        assert!(schema.column("small").unwrap().assign(&mut row, Value::Integer(-1)).is_err());
    }

    #[test]
    fn test_resolve_rejects_bad_lists() {
        let schema = TableSchema::<Everything>::build().unwrap();
        assert!(matches!(schema.resolve(&[]), Err(SchemaError::EmptyFieldList(_))));
        assert!(matches!(
            schema.resolve(&["big", "nope"]),
            Err(SchemaError::UnmappedField { field, .. }) if field == "nope"
        ));
        assert!(matches!(
            schema.resolve(&["big", "big"]),
            Err(SchemaError::DuplicateColumn { .. })
        ));
        let names: Vec<_> = schema
            .resolve(&["flag", "big"])
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["flag", "big"]);
    }

    #[derive(Debug, Default)]
    struct Unnamed {
        id: i64,
    }

    impl Record for Unnamed {
        fn describe(table: &mut TableBuilder<Self>) {
            table.column("id", |r| &r.id, |r| &mut r.id);
        }
    }

    #[test]
    fn test_missing_table_name() {
        assert!(matches!(
            TableSchema::<Unnamed>::build(),
            Err(SchemaError::MissingTableName(name)) if name.ends_with("Unnamed")
        ));
    }
}
