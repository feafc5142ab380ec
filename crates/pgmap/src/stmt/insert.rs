//! INSERT builder.

use crate::client::GenericClient;
use crate::error::{MapResult, MappingError};
use crate::model::Model;
use crate::registry::Registry;
use crate::render;
use crate::schema::Table;
use crate::value::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// A multi-row INSERT for one mapped struct.
///
/// Generated columns are skipped; each appended row contributes one value per
/// insertable column, in table column order.
#[derive(Debug, Clone)]
pub struct Insert<M: Model> {
    pub(crate) table: Arc<Table>,
    pub(crate) rows: Vec<Vec<Value>>,
    _marker: PhantomData<fn(&M)>,
}

impl<M: Model> Insert<M> {
    pub fn new(cx: &Registry) -> Self {
        Self {
            table: cx.table::<M>(),
            rows: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Append one row.
    pub fn row(mut self, cx: &Registry, item: &M) -> MapResult<Self> {
        let mut values = Vec::with_capacity(self.table.columns.len());
        item.write(cx, &mut values)?;
        if values.len() != self.table.columns.len() {
            return Err(MappingError::NoConstructor(M::TABLE).into());
        }
        let row = self
            .table
            .columns
            .iter()
            .zip(values)
            .filter(|(column, _)| !column.generated)
            .map(|(_, value)| value)
            .collect();
        self.rows.push(row);
        Ok(self)
    }

    /// Append many rows.
    pub fn rows<'a, I>(mut self, cx: &Registry, items: I) -> MapResult<Self>
    where
        I: IntoIterator<Item = &'a M>,
        M: 'a,
    {
        for item in items {
            self = self.row(cx, item)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compile to SQL text and an ordered parameter list.
    pub fn compile(&self) -> MapResult<(String, Vec<Value>)> {
        let buf = render::render_insert(&self.table, &self.rows)?;
        Ok(buf.render())
    }

    /// Execute, returning the inserted row count. An empty insert is a no-op.
    pub async fn execute<C: GenericClient>(&self, conn: &C) -> MapResult<u64> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let (sql, params) = self.compile()?;
        tracing::debug!(%sql, params = params.len(), rows = self.rows.len(), "insert");
        conn.execute(&sql, &params).await
    }
}
