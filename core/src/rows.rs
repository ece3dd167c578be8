//! Lazy row materialization.

use std::iter::FusedIterator;

use crate::client::Cursor;
use crate::error::Error;
use crate::types::{Record, TableSchema};

/// Forward-only sequence of records read from one cursor.
///
/// Cursor columns are matched to record fields by name (ASCII
/// case-insensitive) when the sequence starts, so any projection order or
/// superset works; unmatched columns are ignored. `NULL` cells leave the field
/// at its default. A cursor error is yielded once and ends the sequence.
pub struct Rows<'a, T, E> {
    cursor: &'a mut dyn Cursor<Error = E>,
    schema: &'a TableSchema<T>,
    bindings: Vec<Option<usize>>,
    finished: bool,
}

impl<'a, T, E> Rows<'a, T, E> {
    pub fn new(cursor: &'a mut dyn Cursor<Error = E>, schema: &'a TableSchema<T>) -> Self {
        let bindings = cursor
            .column_names()
            .iter()
            .map(|name| schema.position_of(name))
            .collect();
        Self {
            cursor,
            schema,
            bindings,
            finished: false,
        }
    }

    /// Record fields the cursor's columns map to, in cursor order.
    pub fn mapped_fields(&self) -> Vec<&'static str> {
        self.bindings
            .iter()
            .flatten()
            .map(|&index| self.schema.columns()[index].field())
            .collect()
    }
}

impl<T: Record, E: From<Error>> Rows<'_, T, E> {
    fn materialize(&self, cells: Vec<crate::value::Value>) -> Result<T, E> {
        let mut record = T::default();
        for (cell, binding) in cells.into_iter().zip(&self.bindings) {
            let Some(index) = *binding else { continue };
            if cell.is_null() {
                continue;
            }
            let column = &self.schema.columns()[index];
            column
                .assign(&mut record, cell)
                .map_err(|source| Error::Decode {
                    column: column.name().to_string(),
                    source,
                })?;
        }
        Ok(record)
    }
}

impl<T: Record, E: From<Error>> Iterator for Rows<'_, T, E> {
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.cursor.next_row() {
            Ok(Some(cells)) => Some(self.materialize(cells)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<T: Record, E: From<Error>> FusedIterator for Rows<'_, T, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::types::TableBuilder;
    use crate::value::Value;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        nickname: Option<String>,
    }

    impl Record for Person {
        fn describe(table: &mut TableBuilder<Self>) {
            table.name("people");
            table.column("id", |p| &p.id, |p| &mut p.id);
            table.column("name", |p| &p.name, |p| &mut p.name);
            table.column("nickname", |p| &p.nickname, |p| &mut p.nickname);
        }
    }

    struct Scripted {
        names: Vec<String>,
        rows: Vec<Result<Vec<Value>, Error>>,
    }

    impl Scripted {
        fn new(names: &[&str], rows: Vec<Result<Vec<Value>, Error>>) -> Self {
            Self {
                names: names.iter().map(|n| n.to_string()).collect(),
                rows: rows.into_iter().rev().collect(),
            }
        }
    }

    impl Cursor for Scripted {
        type Error = Error;

        fn column_names(&self) -> &[String] {
            &self.names
        }

        fn next_row(&mut self) -> Result<Option<Vec<Value>>, Error> {
            self.rows.pop().transpose()
        }
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_matches_columns_by_name() {
        let schema = TableSchema::<Person>::build().unwrap();
        let mut cursor = Scripted::new(
            &["NAME", "extra", "Id"],
            vec![Ok(vec![text("Ann"), Value::Integer(5), Value::Integer(1)])],
        );
        let rows = Rows::new(&mut cursor, &schema);
        assert_eq!(rows.mapped_fields(), vec!["name", "id"]);

        let people: Vec<Person> = rows.collect::<Result<_, Error>>().unwrap();
        assert_eq!(
            people,
            vec![Person {
                id: 1,
                name: "Ann".to_string(),
                nickname: None,
            }]
        );
    }

    #[test]
    fn test_null_cells_keep_defaults() {
        let schema = TableSchema::<Person>::build().unwrap();
        let mut cursor = Scripted::new(
            &["id", "name", "nickname"],
            vec![Ok(vec![Value::Null, Value::Null, text("Bee")])],
        );
        let person = Rows::new(&mut cursor, &schema).next().unwrap().unwrap();
        assert_eq!(person.id, 0);
        assert_eq!(person.name, "");
        assert_eq!(person.nickname.as_deref(), Some("Bee"));
    }

    #[test]
    fn test_decode_failure_names_column() {
        let schema = TableSchema::<Person>::build().unwrap();
        let mut cursor = Scripted::new(
            &["id", "name"],
            vec![
                Ok(vec![text("one"), text("Ann")]),
                Ok(vec![Value::Integer(2), text("Bob")]),
            ],
        );
        let mut rows = Rows::new(&mut cursor, &schema);
        assert!(matches!(
            rows.next(),
            Some(Err(Error::Decode { column, source: CodecError::TypeConversion { .. } })) if column == "id"
        ));
        assert_eq!(rows.next().unwrap().unwrap().name, "Bob");
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_cursor_error_ends_sequence() {
        let schema = TableSchema::<Person>::build().unwrap();
        let mut cursor = Scripted::new(
            &["id"],
            vec![
                Ok(vec![Value::Integer(1)]),
                Err(Error::Codec(CodecError::Unsupported("cursor closed".into()))),
                Ok(vec![Value::Integer(3)]),
            ],
        );
        let mut rows = Rows::new(&mut cursor, &schema);
        assert_eq!(rows.next().unwrap().unwrap().id, 1);
        assert!(rows.next().unwrap().is_err());
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
    }
}
