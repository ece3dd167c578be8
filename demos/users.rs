//! Basic CRUD workflow example.
//!
//! Declares a record, lets the database create its table, then inserts,
//! queries, updates and deletes rows with the command builder.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rowforge-demos --example users
//! ```

use rowforge_core::{Direction, Expr, Record, TableBuilder, create_table_sql};
use rowforge_sqlite::{Database, DatabaseConfig};

#[derive(Debug, Default, Clone)]
struct User {
    id: i64,
    name: String,
    age: i32,
    email: Option<String>,
}

impl Record for User {
    fn describe(table: &mut TableBuilder<Self>) {
        table.name("users");
        table
            .column("id", |u| &u.id, |u| &mut u.id)
            .primary_key()
            .autoincrement();
        table.column("name", |u| &u.name, |u| &mut u.name).not_null();
        table
            .column("age", |u| &u.age, |u| &mut u.age)
            .check(Expr::col("age").ge(0));
        table
            .column("email", |u| &u.email, |u| &mut u.email)
            .rename("email_address")
            .unique();
    }
}

fn main() {
    // === Step 1: Open an in-memory database ===
    let db = Database::open(DatabaseConfig::in_memory().with_create_tables(true)).unwrap();
    let users = db.table::<User>().unwrap();
    println!("=== Table ===");
    println!("{}", create_table_sql(users.schema()).unwrap());

    // === Step 2: Insert ===
    println!("\n=== Insert ===");
    for (name, age, email) in [
        ("Ann", 30, Some("ann@example.com")),
        ("Bob", 17, None),
        ("Cid", 41, Some("cid@example.com")),
        ("O'Hara", 58, None),
    ] {
        let row = User {
            name: name.to_string(),
            age,
            email: email.map(String::from),
            ..User::default()
        };
        let command = users.insert(&row).unwrap();
        println!("{}", command.sql());
        command.execute().unwrap();
    }

    // === Step 3: Query ===
    println!("\n=== Adults by name ===");
    let adults = users
        .select_all()
        .filter(Expr::col("age").ge(18))
        .unwrap()
        .order_by(&["name"], Direction::Asc)
        .unwrap();
    println!("{}", adults.sql());
    for user in adults.fetch_all().unwrap() {
        println!("  #{} {} ({}) {:?}", user.id, user.name, user.age, user.email);
    }

    let without_email: i64 = users
        .count()
        .filter(Expr::col("email").eq(Expr::null()))
        .unwrap()
        .scalar()
        .unwrap();
    println!("Users without email: {without_email}");

    // === Step 4: Update ===
    println!("\n=== Update ===");
    let birthday = User {
        age: 18,
        ..User::default()
    };
    let update = users
        .update_fields(&birthday, &["age"])
        .unwrap()
        .filter(Expr::col("name").eq("Bob"))
        .unwrap();
    println!("{}", update.sql());
    println!("Updated {} row(s)", update.execute().unwrap());

    // === Step 5: Delete ===
    println!("\n=== Delete ===");
    let delete = users.delete().filter(Expr::col("age").gt(50)).unwrap();
    println!("{}", delete.sql());
    println!("Deleted {} row(s)", delete.execute().unwrap());

    let remaining: i64 = users.count().scalar().unwrap();
    println!("Remaining users: {remaining}");
}
