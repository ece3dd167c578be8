//! Column-level encoding of values into SQL text and bound parameters.
//!
//! Canonical renderings:
//!
//! - `NULL` for [`Value::Null`] regardless of column type.
//! - INTEGER/REAL/NUMERIC columns: base-10 integers, shortest round-trip
//!   floats with `.0` appended to integral values, and numeric text (decimals)
//!   unquoted.
//! - TEXT columns: single-quoted with embedded quotes doubled.
//! - BLOB columns: an `@<column>` placeholder; the framed payload travels as a
//!   parameter.
//!
//! BLOB payloads are framed as a 4-byte big-endian length followed by a CBOR
//! body, so truncated or padded payloads are detected before decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::types::{ColumnSchema, SqlType};
use crate::value::Value;

const LENGTH_PREFIX: usize = 4;

/// How scalar values reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    /// Scalars are inlined as escaped literals; only BLOBs are bound.
    #[default]
    Inline,
    /// Every value, scalar or BLOB, is bound as a named parameter.
    Parameters,
}

/// A value rendered for one column: the SQL text to splice in and, when the
/// text is a placeholder, the value to bind to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub sql: String,
    pub param: Option<Value>,
}

/// Encodes `value` for `column` under the given bind mode.
///
/// # Examples
///
/// ```
/// use rowforge_core::{BindMode, ColumnSchema, SqlType, Value, encode};
///
/// let name = ColumnSchema::new("name", "name", SqlType::Text);
/// let encoded = encode(&name, Value::Text("O'Hara".into()), BindMode::Inline).unwrap();
/// assert_eq!(encoded.sql, "'O''Hara'");
/// assert!(encoded.param.is_none());
///
/// let data = ColumnSchema::new("data", "data", SqlType::Blob);
/// let encoded = encode(&data, Value::Blob(vec![1, 2]), BindMode::Inline).unwrap();
/// assert_eq!(encoded.sql, "@data");
/// assert_eq!(encoded.param, Some(Value::Blob(vec![1, 2])));
/// ```
pub fn encode(column: &ColumnSchema, value: Value, mode: BindMode) -> Result<Encoded, CodecError> {
    if column.sql_type() == SqlType::Blob {
        return match value {
            Value::Null => Ok(literal("NULL".to_string())),
            Value::Blob(bytes) => Ok(Encoded {
                sql: placeholder(column),
                param: Some(Value::Blob(bytes)),
            }),
            other => Err(CodecError::TypeConversion {
                expected: "BLOB",
                found: other.storage_class(),
            }),
        };
    }

    if mode == BindMode::Parameters {
        return Ok(Encoded {
            sql: placeholder(column),
            param: Some(value),
        });
    }

    let sql = match (column.sql_type(), value) {
        (_, Value::Null) => "NULL".to_string(),
        (SqlType::Text, Value::Text(text)) => quote_text(&text),
        (SqlType::Text, other) => quote_text(&render_literal(&other)?),
        (_, numeric) => numeric_text(&numeric)?,
    };
    Ok(literal(sql))
}

fn literal(sql: String) -> Encoded {
    Encoded { sql, param: None }
}

/// Deterministic parameter name for a column's value.
pub fn placeholder(column: &ColumnSchema) -> String {
    format!("@{}", column.name())
}

/// Renders a scalar as a standalone SQL literal (used for predicate
/// constants and `DEFAULT` clauses).
pub fn render_literal(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Real(r) => render_real(*r),
        Value::Text(text) => Ok(quote_text(text)),
        Value::Blob(_) => Err(CodecError::Unsupported(
            "BLOB values cannot be rendered as literals".to_string(),
        )),
    }
}

/// Single-quotes `text`, doubling every embedded quote.
pub fn quote_text(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Shortest round-trip text for a finite float, always carrying a fraction
/// or exponent so SQLite reads it back as REAL.
pub fn render_real(r: f64) -> Result<String, CodecError> {
    if !r.is_finite() {
        return Err(CodecError::Unsupported(format!("non-finite REAL {r}")));
    }
    let text = r.to_string();
    if text.contains(['.', 'e', 'E']) {
        Ok(text)
    } else {
        Ok(format!("{text}.0"))
    }
}

fn numeric_text(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Real(r) => render_real(*r),
        Value::Text(text) if is_numeric_literal(text) => Ok(text.clone()),
        Value::Text(text) => Err(CodecError::Unsupported(format!(
            "non-numeric text '{text}' in numeric column"
        ))),
        other => Err(CodecError::TypeConversion {
            expected: "numeric",
            found: other.storage_class(),
        }),
    }
}

/// Accepts `[-]digits[.digits]`, the shape `Decimal::to_string` produces.
fn is_numeric_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match parts.next() {
        Some(fraction) => all_digits(whole) && all_digits(fraction),
        None => all_digits(whole),
    }
}

/// Serializes a BLOB payload: big-endian `u32` length, then the CBOR body.
pub fn serialize_blob<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let body = serde_cbor::to_vec(value).map_err(|e| CodecError::Serialize(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| CodecError::Serialize("payload exceeds u32::MAX bytes".to_string()))?;

    let mut framed = Vec::with_capacity(LENGTH_PREFIX + body.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Inverse of [`serialize_blob`].
pub fn deserialize_blob<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let Some((header, body)) = bytes.split_at_checked(LENGTH_PREFIX) else {
        return Err(CodecError::Deserialize(format!(
            "payload of {} bytes is shorter than its length prefix",
            bytes.len()
        )));
    };

    let mut prefix = [0u8; LENGTH_PREFIX];
    prefix.copy_from_slice(header);
    let declared = u32::from_be_bytes(prefix) as usize;
    if declared != body.len() {
        return Err(CodecError::Deserialize(format!(
            "length prefix says {declared} bytes, payload has {}",
            body.len()
        )));
    }

    serde_cbor::from_slice(body).map_err(|e| CodecError::Deserialize(e.to_string()))
}
