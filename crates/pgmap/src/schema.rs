//! Schema model: tables, columns, and per-query table sources.

use crate::value::SqlType;
use std::sync::Arc;

/// One column of a mapped table.
///
/// Immutable once the owning [`Table`] is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
    /// Identity/generated columns are excluded from inserts.
    pub generated: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            generated: false,
        }
    }

    pub fn generated(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            generated: true,
        }
    }
}

/// A mapped table: a stable ordered set of columns.
///
/// Constructed once per mapped row type and shared read-only across queries.
#[derive(Debug, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that participate in inserts.
    pub fn insert_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.generated)
    }
}

/// Fluent [`Table`] construction.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
}

impl TableBuilder {
    pub fn column(mut self, name: impl Into<String>, ty: SqlType) -> Self {
        self.columns.push(Column::new(name, ty));
        self
    }

    pub fn generated(mut self, name: impl Into<String>, ty: SqlType) -> Self {
        self.columns.push(Column::generated(name, ty));
        self
    }

    pub fn build(self) -> Arc<Table> {
        Arc::new(Table {
            name: self.name,
            columns: self.columns,
        })
    }
}

/// A usage-site occurrence of a table within one query.
///
/// Distinct sources over the same table (self-joins) are disambiguated by
/// alias. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct TableSource {
    pub table: Arc<Table>,
    pub alias: Option<String>,
}

impl TableSource {
    pub fn new(table: Arc<Table>) -> Self {
        Self { table, alias: None }
    }

    pub fn aliased(table: Arc<Table>, alias: impl Into<String>) -> Self {
        Self {
            table,
            alias: Some(alias.into()),
        }
    }

    /// The name used to qualify this source's columns: alias if present,
    /// otherwise the table name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Arc<Table> {
        Table::builder("users")
            .generated("id", SqlType::Int8)
            .column("name", SqlType::Text)
            .column("age", SqlType::Int4)
            .build()
    }

    #[test]
    fn builder_keeps_column_order() {
        let t = users();
        let names: Vec<_> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "age"]);
    }

    #[test]
    fn generated_columns_skip_inserts() {
        let t = users();
        let names: Vec<_> = t.insert_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "age"]);
    }

    #[test]
    fn source_qualifier_prefers_alias() {
        let t = users();
        assert_eq!(TableSource::new(t.clone()).qualifier(), "users");
        assert_eq!(TableSource::aliased(t, "u").qualifier(), "u");
    }
}
