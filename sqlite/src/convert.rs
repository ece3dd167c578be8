//! Conversion between core [`Value`]s and rusqlite values.

use rowforge_core::{CodecError, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::error::Result;

/// Converts a core value into an owned rusqlite value for binding.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Copies a borrowed cell out of a row.
///
/// # Errors
///
/// Returns a [`CodecError::Deserialize`] for TEXT cells that are not valid
/// UTF-8.
pub(crate) fn from_sql(cell: ValueRef<'_>) -> Result<Value> {
    Ok(match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| CodecError::Deserialize(format!("TEXT cell is not UTF-8: {e}")))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}
