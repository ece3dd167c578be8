//! SQL values and the native-type → SQL-type table.
//!
//! [`Value`] mirrors SQLite's five storage classes. [`FieldType`] is
//! implemented once per supported native type and fixes that type's
//! [`SqlType`] at compile time; the schema registry reads the constant when a
//! column is declared, so there is no runtime type inspection.
//!
//! | native type | SQL type |
//! |---|---|
//! | `i8`–`i64`, `u8`–`u64`, `isize`, `usize` | `INTEGER` |
//! | `f32`, `f64` | `REAL` |
//! | `bool`, `DateTime<Utc>`, `Decimal` | `NUMERIC` |
//! | `String`, `char` | `TEXT` |
//! | [`Blob<T>`] | `BLOB` |
//!
//! `Option<F>` is the nullable form of `F` and keeps `F`'s SQL type.
//!
//! Encodings that have limits:
//!
//! | native type | stored as | limit |
//! |---|---|---|
//! | `u64`, `usize` | INTEGER | at most `i64::MAX` |
//! | `DateTime<Utc>` | epoch nanoseconds | 1677-09-21 to 2262-04-11 |
//! | `Decimal` | INTEGER when whole and within `i64`, otherwise numeric text | 15 significant digits in the text form |
//!
//! A value past its limit fails with [`CodecError::OutOfRange`] instead of
//! being rounded.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::CodecError;
use crate::types::SqlType;

/// A single SQL value, as bound to a statement or read from a cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`; also the absence marker in result cells.
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Name of the storage class, used in conversion errors.
    pub fn storage_class(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A native type that can be stored in a column.
///
/// # Examples
///
/// ```
/// use rowforge_core::{FieldType, SqlType, Value};
///
/// assert_eq!(<u16 as FieldType>::SQL_TYPE, SqlType::Integer);
/// assert_eq!(true.to_value().unwrap(), Value::Integer(1));
/// assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
/// ```
pub trait FieldType: Sized {
    /// Column type derived from this native type.
    const SQL_TYPE: SqlType;

    /// Converts the field into the value that gets rendered or bound.
    fn to_value(&self) -> Result<Value, CodecError>;

    /// Converts a cell read from the database back into the field type.
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

fn mismatch(expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeConversion {
        expected,
        found: found.storage_class(),
    }
}

macro_rules! integer_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const SQL_TYPE: SqlType = SqlType::Integer;

                fn to_value(&self) -> Result<Value, CodecError> {
                    i64::try_from(*self)
                        .map(Value::Integer)
                        .map_err(|_| CodecError::OutOfRange {
                            target: "INTEGER",
                            value: self.to_string(),
                        })
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(i).map_err(|_| CodecError::OutOfRange {
                            target: stringify!($ty),
                            value: i.to_string(),
                        }),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FieldType for f64 {
    const SQL_TYPE: SqlType = SqlType::Real;

    fn to_value(&self) -> Result<Value, CodecError> {
        if self.is_finite() {
            Ok(Value::Real(*self))
        } else {
            Err(CodecError::Unsupported(format!("non-finite REAL {self}")))
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FieldType for f32 {
    const SQL_TYPE: SqlType = SqlType::Real;

    fn to_value(&self) -> Result<Value, CodecError> {
        f64::from(*self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        f64::from_value(value).map(|r| r as f32)
    }
}

impl FieldType for bool {
    const SQL_TYPE: SqlType = SqlType::Numeric;

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Integer(i64::from(*self)))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(i) => Err(CodecError::OutOfRange {
                target: "bool",
                value: i.to_string(),
            }),
            other => Err(mismatch("bool", &other)),
        }
    }
}

/// Stored as Unix epoch nanoseconds, which covers 1677-09-21 through
/// 2262-04-11. Instants outside that range do not encode.
impl FieldType for DateTime<Utc> {
    const SQL_TYPE: SqlType = SqlType::Numeric;

    fn to_value(&self) -> Result<Value, CodecError> {
        self.timestamp_nanos_opt()
            .map(Value::Integer)
            .ok_or_else(|| CodecError::OutOfRange {
                target: "INTEGER",
                value: self.to_rfc3339(),
            })
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Integer(ns) => {
                let secs = ns.div_euclid(NANOS_PER_SEC);
                let nanos = ns.rem_euclid(NANOS_PER_SEC) as u32;
                DateTime::<Utc>::from_timestamp(secs, nanos).ok_or(CodecError::OutOfRange {
                    target: "DateTime<Utc>",
                    value: ns.to_string(),
                })
            }
            other => Err(mismatch("DateTime<Utc>", &other)),
        }
    }
}

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Significant digits a REAL is guaranteed to carry through a decimal
/// round-trip.
const REAL_DIGITS: u32 = 15;

/// Whole values that fit `i64` are stored as INTEGER. Anything else is
/// rendered with its culture-invariant `Display` text, which SQLite's NUMERIC
/// affinity turns into a REAL; such values may carry at most 15 significant
/// digits. Decoding accepts INTEGER, REAL and TEXT cells.
impl FieldType for Decimal {
    const SQL_TYPE: SqlType = SqlType::Numeric;

    fn to_value(&self) -> Result<Value, CodecError> {
        let normalized = self.normalize();
        if normalized.scale() == 0 {
            if let Some(whole) = normalized.to_i64() {
                return Ok(Value::Integer(whole));
            }
        }
        let digits = normalized
            .mantissa()
            .unsigned_abs()
            .checked_ilog10()
            .map_or(0, |log| log + 1);
        if digits > REAL_DIGITS {
            return Err(CodecError::OutOfRange {
                target: "NUMERIC",
                value: self.to_string(),
            });
        }
        Ok(Value::Text(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Integer(i) => Ok(Decimal::from(i)),
            Value::Real(r) => parse_decimal(&r.to_string()),
            Value::Text(s) => parse_decimal(&s),
            other => Err(mismatch("Decimal", &other)),
        }
    }
}

fn parse_decimal(text: &str) -> Result<Decimal, CodecError> {
    Decimal::from_str(text).map_err(|e| CodecError::Unsupported(format!("decimal '{text}': {e}")))
}

impl FieldType for String {
    const SQL_TYPE: SqlType = SqlType::Text;

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FieldType for char {
    const SQL_TYPE: SqlType = SqlType::Text;

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(Value::Text(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(CodecError::OutOfRange {
                        target: "char",
                        value: s,
                    }),
                }
            }
            other => Err(mismatch("char", &other)),
        }
    }
}

impl<F: FieldType> FieldType for Option<F> {
    const SQL_TYPE: SqlType = F::SQL_TYPE;

    fn to_value(&self) -> Result<Value, CodecError> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => F::from_value(other).map(Some),
        }
    }
}

/// Wraps any serde type so it is stored as an opaque BLOB.
///
/// The payload is framed by [`codec::serialize_blob`] and always travels as a
/// bound parameter, never as inline SQL text.
///
/// ```
/// use rowforge_core::{Blob, FieldType, SqlType, Value};
///
/// let tags = Blob(vec!["red".to_string(), "blue".to_string()]);
/// assert_eq!(<Blob<Vec<String>> as FieldType>::SQL_TYPE, SqlType::Blob);
///
/// let cell = tags.to_value().unwrap();
/// assert!(matches!(cell, Value::Blob(_)));
/// assert_eq!(Blob::<Vec<String>>::from_value(cell).unwrap(), tags);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob<T>(pub T);

impl<T> Blob<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Blob<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Blob<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Blob<T> {
    fn from(value: T) -> Self {
        Blob(value)
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for Blob<T> {
    const SQL_TYPE: SqlType = SqlType::Blob;

    fn to_value(&self) -> Result<Value, CodecError> {
        codec::serialize_blob(&self.0).map(Value::Blob)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Blob(bytes) => codec::deserialize_blob(&bytes).map(Blob),
            other => Err(mismatch("BLOB", &other)),
        }
    }
}

macro_rules! value_from_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Text(value.to_string())
    }
}

/// Epoch nanoseconds, saturating outside the storable range so ordering
/// comparisons against stored instants still hold.
impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Integer(value.timestamp_nanos_opt().unwrap_or(if value.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        }))
    }
}

/// Same rendering as the column encoding, without the digit limit: a
/// predicate constant is compared, never stored.
impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        value.to_value().unwrap_or_else(|_| Value::Text(value.to_string()))
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
