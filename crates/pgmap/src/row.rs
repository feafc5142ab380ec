//! Row access abstraction.
//!
//! The plan walk reads rows through [`RowAccess`], so materialization is
//! testable against in-memory rows ([`TestRow`]) and runs unchanged against
//! driver rows.

use crate::error::MappingError;
use crate::value::{SqlType, Value};
use tokio_postgres::types::Type;

/// Ordinal access to one result row.
pub trait RowAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column name at `ordinal`, if known.
    fn name(&self, ordinal: usize) -> Option<&str>;

    /// Decode the value at `ordinal`.
    fn get(&self, ordinal: usize) -> Result<Value, MappingError>;
}

fn get_typed<'a, T>(
    row: &'a tokio_postgres::Row,
    ordinal: usize,
    name: &str,
    into: impl Fn(T) -> Value,
    ty: SqlType,
) -> Result<Value, MappingError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    match row.try_get::<usize, Option<T>>(ordinal) {
        Ok(Some(v)) => Ok(into(v)),
        Ok(None) => Ok(Value::Null(ty)),
        Err(e) => Err(MappingError::conversion(name, ty.pg_name(), e.to_string())),
    }
}

impl RowAccess for tokio_postgres::Row {
    fn len(&self) -> usize {
        self.columns().len()
    }

    fn name(&self, ordinal: usize) -> Option<&str> {
        self.columns().get(ordinal).map(|c| c.name())
    }

    fn get(&self, ordinal: usize) -> Result<Value, MappingError> {
        let column = self
            .columns()
            .get(ordinal)
            .ok_or(MappingError::OrdinalOutOfRange(ordinal))?;
        let name = column.name();
        match *column.type_() {
            Type::BOOL => get_typed(self, ordinal, name, Value::Bool, SqlType::Bool),
            Type::INT2 => get_typed(self, ordinal, name, Value::Int2, SqlType::Int2),
            Type::INT4 => get_typed(self, ordinal, name, Value::Int4, SqlType::Int4),
            Type::INT8 => get_typed(self, ordinal, name, Value::Int8, SqlType::Int8),
            Type::FLOAT4 => get_typed(self, ordinal, name, Value::Float4, SqlType::Float4),
            Type::FLOAT8 => get_typed(self, ordinal, name, Value::Float8, SqlType::Float8),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                get_typed::<String>(self, ordinal, name, Value::Text, SqlType::Text)
            }
            Type::BYTEA => get_typed::<Vec<u8>>(self, ordinal, name, Value::Bytes, SqlType::Bytes),
            Type::UUID => get_typed::<uuid::Uuid>(self, ordinal, name, Value::Uuid, SqlType::Uuid),
            Type::DATE => {
                get_typed::<chrono::NaiveDate>(self, ordinal, name, Value::Date, SqlType::Date)
            }
            Type::TIMESTAMP => get_typed::<chrono::NaiveDateTime>(
                self,
                ordinal,
                name,
                Value::Timestamp,
                SqlType::Timestamp,
            ),
            Type::TIMESTAMPTZ => get_typed::<chrono::DateTime<chrono::Utc>>(
                self,
                ordinal,
                name,
                Value::TimestampTz,
                SqlType::TimestampTz,
            ),
            Type::JSON | Type::JSONB => get_typed::<serde_json::Value>(
                self,
                ordinal,
                name,
                Value::Json,
                SqlType::Json,
            ),
            ref other => Err(MappingError::conversion(
                name,
                "supported column type",
                other.name(),
            )),
        }
    }
}

/// In-memory row for tests.
#[derive(Debug, Clone)]
pub struct TestRow {
    columns: Vec<(String, Value)>,
}

impl TestRow {
    pub fn new<I, N>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(n, v)| (n.into(), v))
                .collect(),
        }
    }
}

impl RowAccess for TestRow {
    fn len(&self) -> usize {
        self.columns.len()
    }

    fn name(&self, ordinal: usize) -> Option<&str> {
        self.columns.get(ordinal).map(|(n, _)| n.as_str())
    }

    fn get(&self, ordinal: usize) -> Result<Value, MappingError> {
        self.columns
            .get(ordinal)
            .map(|(_, v)| v.clone())
            .ok_or(MappingError::OrdinalOutOfRange(ordinal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = TestRow::new([("id", Value::Int8(1)), ("name", Value::Text("a".into()))]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.name(1), Some("name"));
        assert_eq!(row.get(0).unwrap(), Value::Int8(1));
        assert!(matches!(
            row.get(5).unwrap_err(),
            MappingError::OrdinalOutOfRange(5)
        ));
    }
}
