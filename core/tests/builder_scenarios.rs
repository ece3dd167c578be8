use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use rowforge_core::{
    Blob, Client, Cursor, Direction, Error, Expr, Record, SchemaError, SchemaRegistry, Statement,
    Table, TableBuilder, Value, create_table_sql, deserialize_blob,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
enum MockError {
    #[error(transparent)]
    Core(#[from] Error),
}

/// Replays canned result sets and records every statement it is given.
#[derive(Default)]
struct MockClient {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    seen: RefCell<Vec<Statement>>,
}

impl MockClient {
    fn with_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            seen: RefCell::default(),
        }
    }

    fn last(&self) -> Statement {
        self.seen.borrow().last().cloned().unwrap()
    }
}

struct MockCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl Cursor for MockCursor {
    type Error = MockError;

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, MockError> {
        Ok(self.rows.next())
    }
}

impl Client for MockClient {
    type Error = MockError;

    fn execute(&self, statement: &Statement) -> Result<usize, MockError> {
        self.seen.borrow_mut().push(statement.clone());
        Ok(1)
    }

    fn execute_reader<R, F>(&self, statement: &Statement, read: F) -> Result<R, MockError>
    where
        F: FnOnce(&mut dyn Cursor<Error = MockError>) -> Result<R, MockError>,
    {
        self.seen.borrow_mut().push(statement.clone());
        let mut cursor = MockCursor {
            columns: self.columns.clone(),
            rows: self.rows.clone().into_iter(),
        };
        read(&mut cursor)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i32,
}

impl Record for User {
    fn describe(table: &mut TableBuilder<Self>) {
        table.name("users");
        table
            .column("id", |u| &u.id, |u| &mut u.id)
            .primary_key()
            .autoincrement();
        table.column("name", |u| &u.name, |u| &mut u.name);
        table.column("age", |u| &u.age, |u| &mut u.age);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Inventory {
    gold: u32,
    items: BTreeMap<String, u16>,
}

#[derive(Debug, Default)]
struct Save {
    slot: i64,
    inventory: Blob<Inventory>,
}

impl Record for Save {
    fn describe(table: &mut TableBuilder<Self>) {
        table.name("saves");
        table.column("slot", |s| &s.slot, |s| &mut s.slot).primary_key();
        table.column("inventory", |s| &s.inventory, |s| &mut s.inventory);
    }
}

fn users(client: &MockClient) -> Table<'_, User, MockClient> {
    let registry = SchemaRegistry::new();
    Table::new(client, registry.get_or_build::<User>().unwrap())
}

#[test]
fn scenario_a_insert_omits_autoincrement_id() {
    let client = MockClient::default();
    let ann = User {
        id: 0,
        name: "Ann".to_string(),
        age: 30,
    };

    let affected = users(&client).insert(&ann).unwrap().execute().unwrap();

    assert_eq!(affected, 1);
    let statement = client.last();
    assert_eq!(statement.sql, "INSERT INTO users (name, age) VALUES ('Ann', 30)");
    assert!(statement.params.is_empty());
}

#[test]
fn scenario_b_filtered_ordered_limited_select() {
    let client = MockClient::default();
    let query = users(&client)
        .select_all()
        .filter(Expr::col("age").gt(18).and(Expr::col("age").le(65)))
        .unwrap()
        .order_by(&["name"], Direction::Asc)
        .unwrap()
        .limit(10);

    assert_eq!(
        query.sql(),
        "SELECT * FROM users WHERE (age > 18) AND (age <= 65) ORDER BY name ASC LIMIT 10"
    );
    assert!(query.fetch_all().unwrap().is_empty());
}

#[test]
fn scenario_c_explicit_autoincrement_is_immutable() {
    let client = MockClient::default();
    let err = users(&client)
        .insert_fields(&User::default(), &["id", "name"])
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Schema(SchemaError::ImmutableColumn { ref table, ref column })
            if table == "users" && column == "id"
    ));
    assert!(client.seen.borrow().is_empty());
}

#[test]
fn scenario_d_blob_travels_as_one_parameter() {
    let client = MockClient::default();
    let registry = SchemaRegistry::new();
    let saves = Table::new(&client, registry.get_or_build::<Save>().unwrap());

    let mut items = BTreeMap::new();
    items.insert("potion".to_string(), 3);
    let inventory = Inventory { gold: 120, items };
    let save = Save {
        slot: 1,
        inventory: Blob(inventory.clone()),
    };

    saves.insert(&save).unwrap().execute().unwrap();

    let statement = client.last();
    assert_eq!(statement.sql, "INSERT INTO saves (slot, inventory) VALUES (1, @inventory)");
    assert_eq!(statement.params.len(), 1);
    assert_eq!(statement.params[0].name, "@inventory");
    let Value::Blob(bytes) = &statement.params[0].value else {
        panic!("expected a BLOB parameter, got {:?}", statement.params[0].value);
    };
    assert_eq!(deserialize_blob::<Inventory>(bytes).unwrap(), inventory);
}

#[test]
fn scenario_e_narrow_select_leaves_id_default() {
    let client = MockClient::with_rows(
        &["name", "age"],
        vec![
            vec![Value::Text("Ann".into()), Value::Integer(30)],
            vec![Value::Text("Bob".into()), Value::Integer(41)],
        ],
    );

    let people = users(&client)
        .select(&["name", "age"])
        .unwrap()
        .fetch_all()
        .unwrap();

    assert_eq!(client.last().sql, "SELECT name, age FROM users");
    assert_eq!(
        people,
        vec![
            User {
                id: 0,
                name: "Ann".to_string(),
                age: 30,
            },
            User {
                id: 0,
                name: "Bob".to_string(),
                age: 41,
            },
        ]
    );
}

#[test]
fn rows_are_lazy_within_the_callback() {
    let client = MockClient::with_rows(
        &["id", "name", "age"],
        (1..=5)
            .map(|i| vec![Value::Integer(i), Value::Text(format!("u{i}")), Value::Integer(20)])
            .collect(),
    );

    let firsts = users(&client)
        .select_all()
        .with_rows(|rows| rows.take(2).map(|r| r.map(|u| u.id)).collect::<Result<Vec<_>, _>>())
        .unwrap();

    assert_eq!(firsts, vec![1, 2]);
}

#[test]
fn count_reads_scalar() {
    let client = MockClient::with_rows(&["COUNT(*)"], vec![vec![Value::Integer(7)]]);
    let total: i64 = users(&client).count().scalar().unwrap();
    assert_eq!(total, 7);
    assert_eq!(client.last().sql, "SELECT COUNT(*) FROM users");
}

#[test]
fn decode_errors_surface_through_client_error() {
    let client = MockClient::with_rows(&["age"], vec![vec![Value::Text("old".into())]]);
    let err = users(&client).select(&["age"]).unwrap().fetch_all().unwrap_err();
    assert!(matches!(err, MockError::Core(Error::Decode { ref column, .. }) if column == "age"));
}

#[test]
fn registry_shares_schema_between_tables() {
    let registry = SchemaRegistry::new();
    let first = registry.get_or_build::<User>().unwrap();
    let second = registry.get_or_build::<User>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        create_table_sql(&first).unwrap(),
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER)"
    );
}
