//! DELETE builder.

use crate::client::GenericClient;
use crate::error::MapResult;
use crate::expr::Expr;
use crate::model::Model;
use crate::registry::Registry;
use crate::render;
use crate::schema::Table;
use crate::value::Value;
use std::sync::Arc;

/// An immutable DELETE description.
///
/// Compiling without a filter is an error unless [`Delete::without_where`]
/// was called.
#[derive(Debug, Clone)]
pub struct Delete {
    pub(crate) table: Arc<Table>,
    pub(crate) filters: Vec<Expr>,
    pub(crate) allow_all: bool,
}

impl Delete {
    pub fn table<M: Model>(cx: &Registry) -> Self {
        Self::from_table(cx.table::<M>())
    }

    pub fn from_table(table: Arc<Table>) -> Self {
        Self {
            table,
            filters: Vec::new(),
            allow_all: false,
        }
    }

    pub fn filter(&self, predicate: Expr) -> Self {
        let mut next = self.clone();
        next.filters.push(predicate);
        next
    }

    /// Opt in to deleting every row.
    pub fn without_where(&self) -> Self {
        let mut next = self.clone();
        next.allow_all = true;
        next
    }

    /// Compile to SQL text and an ordered parameter list.
    pub fn compile(&self, cx: &Registry) -> MapResult<(String, Vec<Value>)> {
        let buf = render::render_delete(cx, self)?;
        Ok(buf.render())
    }

    /// Execute, returning the affected row count.
    pub async fn execute<C: GenericClient>(&self, cx: &Registry, conn: &C) -> MapResult<u64> {
        let (sql, params) = self.compile(cx)?;
        tracing::debug!(%sql, params = params.len(), "delete");
        conn.execute(&sql, &params).await
    }
}
