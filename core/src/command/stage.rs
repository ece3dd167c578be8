//! Builder stages and the capabilities each one grants.
//!
//! Every [`Command`](super::Command) carries one of the zero-sized markers
//! below. A clause method exists only on the stages whose capability trait
//! allows it, so an out-of-order clause is a type error:
//!
//! | stage | next clauses | runs as |
//! |---|---|---|
//! | [`Select`] | `distinct`, `filter`, `group_by`, `order_by`, `limit` | query |
//! | [`Distinct`] | `filter`, `group_by`, `order_by`, `limit` | query |
//! | [`Where`] | `group_by`, `order_by`, `limit` | query |
//! | [`GroupBy`] | `having`, `order_by`, `limit` | query |
//! | [`Having`] | `order_by`, `limit` | query |
//! | [`OrderBy`] | `limit` | query |
//! | [`Limit`] | none | query |
//! | [`Count`] | `filter` | scalar |
//! | [`CountWhere`] | none | scalar |
//! | [`Insert`] | none | non-query |
//! | [`Update`], [`Delete`] | `filter` | non-query |
//! | [`Filtered`] | none | non-query |
//!
//! The legal chain compiles:
//!
//! ```
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let query = users
//!     .select(&["age"]).unwrap()
//!     .distinct()
//!     .filter(Expr::col("age").gt(18)).unwrap()
//!     .group_by(&["age"]).unwrap()
//!     .having(Expr::count().gt(1)).unwrap()
//!     .order_by(&["age"], Direction::Desc).unwrap()
//!     .limit_offset(10, 20);
//! assert_eq!(
//!     query.sql(),
//!     "SELECT DISTINCT age FROM users WHERE age > 18 GROUP BY age HAVING COUNT(*) > 1 \
//!      ORDER BY age DESC LIMIT 10 OFFSET 20"
//! );
//! ```
//!
//! `HAVING` needs a `GROUP BY` first:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.select_all().having(Expr::count().gt(1));
//! ```
//!
//! `WHERE` cannot follow `LIMIT`:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.select_all().limit(10).filter(Expr::col("age").gt(18));
//! ```
//!
//! `DISTINCT` must come straight after the projection:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.select_all().filter(Expr::col("age").gt(18)).unwrap().distinct();
//! ```
//!
//! An insert takes no `WHERE`:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.insert(&User::default()).unwrap().filter(Expr::col("id").eq(1));
//! ```
//!
//! A query cannot run as a non-query:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.select_all().execute();
//! ```
//!
//! A count yields one value, not rows:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.count().fetch_all();
//! ```
//!
//! and takes no grouping:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let _ = users.count().filter(Expr::col("age").gt(18)).unwrap().group_by(&["age"]);
//! ```
//!
//! A filtered delete cannot be filtered again:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use rowforge_core::*;
//! # #[derive(Debug, Default)]
//! # struct User { id: i64, age: i32 }
//! # impl Record for User {
//! #     fn describe(t: &mut TableBuilder<Self>) {
//! #         t.name("users");
//! #         t.column("id", |u| &u.id, |u| &mut u.id);
//! #         t.column("age", |u| &u.age, |u| &mut u.age);
//! #     }
//! # }
//! # let client = DryRun::new();
//! # let users = Table::new(&client, Arc::new(TableSchema::<User>::build().unwrap()));
//! let once = users.delete().filter(Expr::col("age").lt(18)).unwrap();
//! let _ = once.filter(Expr::col("id").eq(1));
//! ```

mod sealed {
    pub trait Sealed {}
}

/// Marker for a builder stage. Sealed; the set of stages is fixed.
pub trait Stage: sealed::Sealed {}

macro_rules! stages {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $name {}

            impl sealed::Sealed for $name {}
            impl Stage for $name {}
        )*
    };
}

stages!(
    /// `INSERT INTO …` / `REPLACE INTO …`
    Insert,
    /// `SELECT …` with no clauses yet.
    Select,
    Distinct,
    /// Query after `WHERE`.
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    /// `SELECT COUNT(*) …` with no `WHERE` yet.
    Count,
    /// Count after `WHERE`.
    CountWhere,
    /// `UPDATE … SET …` with no `WHERE` yet.
    Update,
    /// `DELETE FROM …` with no `WHERE` yet.
    Delete,
    /// Update or delete after `WHERE`.
    Filtered,
);

/// Stages that accept a `WHERE` clause.
pub trait Filterable: Stage {
    /// Stage reached once the clause is added.
    type Next: Stage;
}

impl Filterable for Select {
    type Next = Where;
}

impl Filterable for Distinct {
    type Next = Where;
}

impl Filterable for Count {
    type Next = CountWhere;
}

impl Filterable for Update {
    type Next = Filtered;
}

impl Filterable for Delete {
    type Next = Filtered;
}

/// Stages that accept `GROUP BY`.
pub trait Groupable: Stage {}

impl Groupable for Select {}
impl Groupable for Distinct {}
impl Groupable for Where {}

/// Stages that accept `ORDER BY`.
pub trait Orderable: Stage {}

impl Orderable for Select {}
impl Orderable for Distinct {}
impl Orderable for Where {}
impl Orderable for GroupBy {}
impl Orderable for Having {}

/// Stages that accept `LIMIT`.
pub trait Limitable: Stage {}

impl Limitable for Select {}
impl Limitable for Distinct {}
impl Limitable for Where {}
impl Limitable for GroupBy {}
impl Limitable for Having {}
impl Limitable for OrderBy {}

/// Stages that run as a query and produce rows.
pub trait Query: Stage {}

impl Query for Select {}
impl Query for Distinct {}
impl Query for Where {}
impl Query for GroupBy {}
impl Query for Having {}
impl Query for OrderBy {}
impl Query for Limit {}

/// Stages whose first result column can be read as a single value.
pub trait Scalar: Stage {}

impl Scalar for Select {}
impl Scalar for Distinct {}
impl Scalar for Where {}
impl Scalar for GroupBy {}
impl Scalar for Having {}
impl Scalar for OrderBy {}
impl Scalar for Limit {}
impl Scalar for Count {}
impl Scalar for CountWhere {}

/// Stages that run as a statement and report affected rows.
pub trait NonQuery: Stage {}

impl NonQuery for Insert {}
impl NonQuery for Update {}
impl NonQuery for Delete {}
impl NonQuery for Filtered {}
