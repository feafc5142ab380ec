//! UPDATE builder.

use crate::client::GenericClient;
use crate::error::MapResult;
use crate::expr::Expr;
use crate::model::Model;
use crate::registry::Registry;
use crate::render;
use crate::schema::Table;
use crate::value::Value;
use std::sync::Arc;

/// An immutable UPDATE description.
///
/// Compiling without a filter is an error unless [`Update::without_where`]
/// was called; a full-table update must be an explicit decision.
#[derive(Debug, Clone)]
pub struct Update {
    pub(crate) table: Arc<Table>,
    pub(crate) sets: Vec<(String, Expr)>,
    pub(crate) filters: Vec<Expr>,
    pub(crate) allow_all: bool,
}

impl Update {
    pub fn table<M: Model>(cx: &Registry) -> Self {
        Self::from_table(cx.table::<M>())
    }

    pub fn from_table(table: Arc<Table>) -> Self {
        Self {
            table,
            sets: Vec::new(),
            filters: Vec::new(),
            allow_all: false,
        }
    }

    /// Set a column to a constant. Always bound as a parameter.
    pub fn set(&self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_expr(column, Expr::Value(value.into()))
    }

    /// Set a column from an expression (`"count" = "count" + 1`).
    pub fn set_expr(&self, column: impl Into<String>, expr: Expr) -> Self {
        let mut next = self.clone();
        next.sets.push((column.into(), expr));
        next
    }

    pub fn filter(&self, predicate: Expr) -> Self {
        let mut next = self.clone();
        next.filters.push(predicate);
        next
    }

    /// Opt in to updating every row.
    pub fn without_where(&self) -> Self {
        let mut next = self.clone();
        next.allow_all = true;
        next
    }

    /// Compile to SQL text and an ordered parameter list.
    pub fn compile(&self, cx: &Registry) -> MapResult<(String, Vec<Value>)> {
        let buf = render::render_update(cx, self)?;
        Ok(buf.render())
    }

    /// Execute, returning the affected row count.
    pub async fn execute<C: GenericClient>(&self, cx: &Registry, conn: &C) -> MapResult<u64> {
        let (sql, params) = self.compile(cx)?;
        tracing::debug!(%sql, params = params.len(), "update");
        conn.execute(&sql, &params).await
    }
}
