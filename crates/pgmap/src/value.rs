//! Runtime SQL values and their declared types.
//!
//! [`Value`] is the closed union carried by parameter fragments and produced
//! by row access. Keeping it closed (instead of `Arc<dyn ToSql>`) lets the
//! renderer inspect constants for inlining and enum coercion, and lets the
//! materialization engine decode rows without driver round-trips.

use bytes::BytesMut;
use serde::Serialize;
use std::error::Error as StdError;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// Declared SQL type of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SqlType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Bytes,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Json,
}

impl SqlType {
    /// Postgres type name, used for diagnostics and typed-column hints.
    pub fn pg_name(self) -> &'static str {
        match self {
            SqlType::Bool => "boolean",
            SqlType::Int2 => "smallint",
            SqlType::Int4 => "integer",
            SqlType::Int8 => "bigint",
            SqlType::Float4 => "real",
            SqlType::Float8 => "double precision",
            SqlType::Text => "text",
            SqlType::Bytes => "bytea",
            SqlType::Uuid => "uuid",
            SqlType::Date => "date",
            SqlType::Timestamp => "timestamp",
            SqlType::TimestampTz => "timestamptz",
            SqlType::Json => "jsonb",
        }
    }
}

/// A runtime value bound to a statement or read from a row.
///
/// `Null` carries the declared type so that a null parameter still reports a
/// concrete column type to the driver and statement arity stays constant.
///
/// Serializes with serde for structured logging of bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null(SqlType),
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Date(chrono::NaiveDate),
    Timestamp(chrono::NaiveDateTime),
    TimestampTz(chrono::DateTime<chrono::Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// The declared type of this value.
    pub fn sql_type(&self) -> SqlType {
        match self {
            Value::Null(ty) => *ty,
            Value::Bool(_) => SqlType::Bool,
            Value::Int2(_) => SqlType::Int2,
            Value::Int4(_) => SqlType::Int4,
            Value::Int8(_) => SqlType::Int8,
            Value::Float4(_) => SqlType::Float4,
            Value::Float8(_) => SqlType::Float8,
            Value::Text(_) => SqlType::Text,
            Value::Bytes(_) => SqlType::Bytes,
            Value::Uuid(_) => SqlType::Uuid,
            Value::Date(_) => SqlType::Date,
            Value::Timestamp(_) => SqlType::Timestamp,
            Value::TimestampTz(_) => SqlType::TimestampTz,
            Value::Json(_) => SqlType::Json,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Short name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null(_) => "null",
            other => other.sql_type().pg_name(),
        }
    }

    /// Whether this value may be rendered as an inline literal when the
    /// rendering context allows it. Everything else is always a parameter.
    pub fn can_inline(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int2(_)
                | Value::Int4(_)
                | Value::Int8(_)
                | Value::Float4(_)
                | Value::Float8(_)
                | Value::Text(_)
        )
    }

    /// Widening integer view, used by the constant folder and enum coercion.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int2(v) => Some(i64::from(*v)),
            Value::Int4(v) => Some(i64::from(*v)),
            Value::Int8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float4(v) => Some(f64::from(*v)),
            Value::Float8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value as an inline SQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled, bools render
    /// as `TRUE`/`FALSE`, nulls as `NULL`. This is the only non-parameterized
    /// value path and exists for contexts like `LIMIT` or explicit opt-in.
    pub fn write_literal(&self, out: &mut String) {
        match self {
            Value::Null(_) => out.push_str("NULL"),
            Value::Bool(true) => out.push_str("TRUE"),
            Value::Bool(false) => out.push_str("FALSE"),
            Value::Int2(v) => out.push_str(&v.to_string()),
            Value::Int4(v) => out.push_str(&v.to_string()),
            Value::Int8(v) => out.push_str(&v.to_string()),
            Value::Float4(v) => out.push_str(&v.to_string()),
            Value::Float8(v) => out.push_str(&v.to_string()),
            Value::Text(s) => write_quoted(out, s),
            Value::Bytes(b) => {
                out.push_str("'\\x");
                for byte in b {
                    out.push_str(&format!("{byte:02x}"));
                }
                out.push('\'');
            }
            Value::Uuid(u) => write_quoted(out, &u.to_string()),
            Value::Date(d) => write_quoted(out, &d.to_string()),
            Value::Timestamp(t) => write_quoted(out, &t.to_string()),
            Value::TimestampTz(t) => write_quoted(out, &t.to_rfc3339()),
            Value::Json(j) => write_quoted(out, &j.to_string()),
        }
    }

    /// Inline literal as an owned string.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Value::Null(_) => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int2(v) => v.to_sql(ty, out),
            Value::Int4(v) => v.to_sql(ty, out),
            Value::Int8(v) => v.to_sql(ty, out),
            Value::Float4(v) => v.to_sql(ty, out),
            Value::Float8(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::TimestampTz(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Per-variant mismatch is reported by the driver at bind time.
        true
    }

    to_sql_checked!();
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int2(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int4(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int8(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float4(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float8(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}
