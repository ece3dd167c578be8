//! `CREATE TABLE` / `DROP TABLE` text for a registered schema.

use crate::codec::render_literal;
use crate::compile::compile;
use crate::error::Result;
use crate::types::{Constraint, TableSchema};

/// Renders `CREATE TABLE <name> (<col> <TYPE> <constraints...>, ...)`,
/// constraints space-joined in declaration order.
///
/// ```
/// use rowforge_core::{Record, TableBuilder, TableSchema, create_table_sql};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     age: i32,
/// }
///
/// impl Record for User {
///     fn describe(table: &mut TableBuilder<Self>) {
///         table.name("users");
///         table.column("id", |u| &u.id, |u| &mut u.id).primary_key().autoincrement();
///         table.column("name", |u| &u.name, |u| &mut u.name).not_null();
///         table.column("age", |u| &u.age, |u| &mut u.age);
///     }
/// }
///
/// let schema = TableSchema::<User>::build().unwrap();
/// assert_eq!(
///     create_table_sql(&schema).unwrap(),
///     "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, age INTEGER)"
/// );
/// ```
pub fn create_table_sql<T>(schema: &TableSchema<T>) -> Result<String> {
    let mut definitions = Vec::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let mut parts = vec![column.name().to_string(), column.sql_type().to_string()];
        for constraint in column.schema().constraints() {
            parts.push(render_constraint(schema, constraint)?);
        }
        definitions.push(parts.join(" "));
    }
    Ok(format!(
        "CREATE TABLE {} ({})",
        schema.table_name(),
        definitions.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS <name>`
pub fn drop_table_sql<T>(schema: &TableSchema<T>) -> String {
    format!("DROP TABLE IF EXISTS {}", schema.table_name())
}

fn render_constraint<T>(schema: &TableSchema<T>, constraint: &Constraint) -> Result<String> {
    Ok(match constraint {
        Constraint::PrimaryKey => "PRIMARY KEY".to_string(),
        Constraint::Unique => "UNIQUE".to_string(),
        Constraint::NotNull => "NOT NULL".to_string(),
        Constraint::Default(value) => format!("DEFAULT {}", render_literal(value)?),
        Constraint::Check(predicate) => format!("CHECK({})", compile(schema, predicate)?),
        Constraint::Autoincrement => "AUTOINCREMENT".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::expr::Expr;
    use crate::types::{Record, TableBuilder};
    use crate::value::Blob;

    #[derive(Debug, Default)]
    struct Product {
        sku: String,
        label: String,
        price: f64,
        stock: i32,
        active: bool,
        added: DateTime<Utc>,
        tags: Blob<Vec<String>>,
    }

    impl Record for Product {
        fn describe(table: &mut TableBuilder<Self>) {
            table.name("products");
            table.column("sku", |p| &p.sku, |p| &mut p.sku).primary_key();
            table
                .column("label", |p| &p.label, |p| &mut p.label)
                .not_null()
                .unique()
                .default("unnamed");
            table
                .column("price", |p| &p.price, |p| &mut p.price)
                .default(0.0)
                .check(Expr::col("price").ge(0));
            table
                .column("stock", |p| &p.stock, |p| &mut p.stock)
                .rename("in_stock")
                .default(-1)
                .check(Expr::col("stock").ge(-1).and(Expr::col("stock").lt(10_000)));
            table.column("active", |p| &p.active, |p| &mut p.active).default(true);
            table.column("added", |p| &p.added, |p| &mut p.added);
            table.column("tags", |p| &p.tags, |p| &mut p.tags);
        }
    }

    #[test]
    fn test_create_table_renders_constraints_in_order() {
        let schema = TableSchema::<Product>::build().unwrap();
        assert_eq!(
            create_table_sql(&schema).unwrap(),
            "CREATE TABLE products (\
             sku TEXT PRIMARY KEY, \
             label TEXT NOT NULL UNIQUE DEFAULT 'unnamed', \
             price REAL DEFAULT 0.0 CHECK(price >= 0), \
             in_stock INTEGER DEFAULT -1 CHECK((in_stock >= -1) AND (in_stock < 10000)), \
             active NUMERIC DEFAULT 1, \
             added NUMERIC, \
             tags BLOB)"
        );
    }

    #[test]
    fn test_drop_table() {
        let schema = TableSchema::<Product>::build().unwrap();
        assert_eq!(drop_table_sql(&schema), "DROP TABLE IF EXISTS products");
    }
}
