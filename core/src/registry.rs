//! Build-once cache of table schemas, keyed by record type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::SchemaError;
use crate::types::{Record, TableSchema};

type Entry = Arc<dyn Any + Send + Sync>;

/// Holds one [`TableSchema`] per record type.
///
/// Schemas are built on first request and never change afterwards, so every
/// later lookup for the same type returns the same `Arc`. Concurrent first
/// requests for a type race on a write lock; the loser discards its build and
/// takes the stored entry.
///
/// ```
/// use std::sync::Arc;
/// use rowforge_core::{Record, SchemaRegistry, TableBuilder};
///
/// #[derive(Debug, Default)]
/// struct Tag {
///     label: String,
/// }
///
/// impl Record for Tag {
///     fn describe(table: &mut TableBuilder<Self>) {
///         table.name("tags");
///         table.column("label", |t| &t.label, |t| &mut t.label).unique();
///     }
/// }
///
/// let registry = SchemaRegistry::new();
/// let first = registry.get_or_build::<Tag>().unwrap();
/// let second = registry.get_or_build::<Tag>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Entry>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached schema for `T`, building and validating it on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] raised by [`TableSchema::build`]. Failed
    /// builds are not cached.
    pub fn get_or_build<T: Record>(&self) -> Result<Arc<TableSchema<T>>, SchemaError> {
        let key = TypeId::of::<T>();

        if let Some(entry) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(downcast(entry.clone()));
        }

        let built = Arc::new(TableSchema::<T>::build()?);

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = schemas.get(&key) {
            return Ok(downcast(entry.clone()));
        }
        debug!(
            record = built.record(),
            table = built.table_name(),
            columns = built.columns().len(),
            "Registered table schema"
        );
        schemas.insert(key, built.clone());
        Ok(built)
    }

    /// Whether `T` has already been registered.
    pub fn contains<T: Record>(&self) -> bool {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Record>(entry: Entry) -> Arc<TableSchema<T>> {
    entry
        .downcast::<TableSchema<T>>()
        .ok()
        .expect("registry entries are keyed by the TypeId of their record")
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::types::TableBuilder;

    macro_rules! record {
        ($name:ident, $table:literal) => {
            #[derive(Debug, Default)]
            struct $name {
                id: i64,
            }

            impl Record for $name {
                fn describe(table: &mut TableBuilder<Self>) {
                    table.name($table);
                    table.column("id", |r| &r.id, |r| &mut r.id).primary_key();
                }
            }
        };
    }

    record!(Alpha, "alpha");
    record!(Beta, "beta");
    record!(Gamma, "gamma");
    record!(Delta, "delta");

    #[derive(Debug, Default)]
    struct Broken;

    impl Record for Broken {
        fn describe(table: &mut TableBuilder<Self>) {
            table.name("broken");
        }
    }

    #[test]
    fn test_repeat_lookup_returns_same_schema() {
        let registry = SchemaRegistry::new();
        let a = registry.get_or_build::<Alpha>().unwrap();
        let b = registry.get_or_build::<Alpha>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<Alpha>());
        assert!(!registry.contains::<Beta>());
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let registry = SchemaRegistry::new();
        assert!(registry.get_or_build::<Broken>().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_first_registration() {
        let registry = SchemaRegistry::new();
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let registry = &registry;
                    scope.spawn(move || match i % 4 {
                        0 => registry.get_or_build::<Alpha>().map(|s| Arc::as_ptr(&s) as usize),
                        1 => registry.get_or_build::<Beta>().map(|s| Arc::as_ptr(&s) as usize),
                        2 => registry.get_or_build::<Gamma>().map(|s| Arc::as_ptr(&s) as usize),
                        _ => registry.get_or_build::<Delta>().map(|s| Arc::as_ptr(&s) as usize),
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });

        assert_eq!(registry.len(), 4);
        for (i, ptr) in results.iter().enumerate() {
            assert_eq!(*ptr, results[i % 4]);
        }
        assert_eq!(
            Arc::as_ptr(&registry.get_or_build::<Gamma>().unwrap()) as usize,
            results[2]
        );
    }
}
