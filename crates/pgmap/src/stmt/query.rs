//! SELECT builder.

use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::{MapError, MapResult};
use crate::expr::Expr;
use crate::field::Field;
use crate::reader::materialize;
use crate::registry::Registry;
use crate::render::{self, RenderOptions};
use crate::schema::{Table, TableSource};
use crate::value::Value;
use futures_core::Stream;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// One joined table source.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) source: TableSource,
    pub(crate) on: Option<Expr>,
}

/// An immutable SELECT description.
///
/// Combinators return a new query; the receiver is never modified. Column
/// references use `(source, name)` where source 0 is the primary table and
/// joined tables follow in join order.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) source: TableSource,
    pub(crate) joins: Vec<Join>,
    pub(crate) filters: Vec<Expr>,
    pub(crate) groupings: Vec<Expr>,
    pub(crate) orderings: Vec<(Expr, bool)>,
    pub(crate) projection: Option<Vec<(String, Expr)>>,
    pub(crate) limit: Option<u64>,
}

impl Query {
    /// Query over a mapped struct's table.
    pub fn table<M: crate::model::Model>(cx: &Registry) -> Self {
        Self::from_table(cx.table::<M>())
    }

    /// Query over an explicit table description.
    pub fn from_table(table: Arc<Table>) -> Self {
        Self {
            source: TableSource::new(table),
            joins: Vec::new(),
            filters: Vec::new(),
            groupings: Vec::new(),
            orderings: Vec::new(),
            projection: None,
            limit: None,
        }
    }

    /// All table sources, primary first, joins in declaration order.
    pub(crate) fn sources(&self) -> Vec<TableSource> {
        let mut sources = Vec::with_capacity(1 + self.joins.len());
        sources.push(self.source.clone());
        sources.extend(self.joins.iter().map(|j| j.source.clone()));
        sources
    }

    /// Add a filter; multiple filters combine with `AND`.
    pub fn filter(&self, predicate: Expr) -> Self {
        let mut next = self.clone();
        next.filters.push(predicate);
        next
    }

    fn join_kind(&self, kind: JoinKind, table: Arc<Table>, on: Option<Expr>) -> Self {
        let mut next = self.clone();
        // A table joined against itself gets a distinct generated alias so
        // both occurrences stay addressable.
        let occurrences = next
            .sources()
            .iter()
            .filter(|s| s.table.name == table.name)
            .count();
        let source = if occurrences > 0 {
            let alias = format!("{}_{}", table.name, occurrences + 1);
            TableSource::aliased(table, alias)
        } else {
            TableSource::new(table)
        };
        next.joins.push(Join { kind, source, on });
        next
    }

    pub fn join(&self, table: Arc<Table>, on: Expr) -> Self {
        self.join_kind(JoinKind::Inner, table, Some(on))
    }

    pub fn left_join(&self, table: Arc<Table>, on: Expr) -> Self {
        self.join_kind(JoinKind::Left, table, Some(on))
    }

    pub fn right_join(&self, table: Arc<Table>, on: Expr) -> Self {
        self.join_kind(JoinKind::Right, table, Some(on))
    }

    pub fn full_join(&self, table: Arc<Table>, on: Expr) -> Self {
        self.join_kind(JoinKind::Full, table, Some(on))
    }

    pub fn cross_join(&self, table: Arc<Table>) -> Self {
        self.join_kind(JoinKind::Cross, table, None)
    }

    /// Replace the projection with explicit named terms.
    pub fn select<I, N>(&self, terms: I) -> Self
    where
        I: IntoIterator<Item = (N, Expr)>,
        N: Into<String>,
    {
        let mut next = self.clone();
        next.projection = Some(
            terms
                .into_iter()
                .map(|(name, expr)| (name.into(), expr))
                .collect(),
        );
        next
    }

    pub fn group_by(&self, expr: Expr) -> Self {
        let mut next = self.clone();
        next.groupings.push(expr);
        next
    }

    pub fn order_by(&self, expr: Expr) -> Self {
        let mut next = self.clone();
        next.orderings.push((expr, false));
        next
    }

    pub fn order_by_desc(&self, expr: Expr) -> Self {
        let mut next = self.clone();
        next.orderings.push((expr, true));
        next
    }

    pub fn limit(&self, n: u64) -> Self {
        let mut next = self.clone();
        next.limit = Some(n);
        next
    }

    /// Compile to SQL text and an ordered parameter list.
    pub fn compile(&self, cx: &Registry) -> MapResult<(String, Vec<Value>)> {
        self.compile_with(cx, RenderOptions::default())
    }

    pub fn compile_with(
        &self,
        cx: &Registry,
        opts: RenderOptions,
    ) -> MapResult<(String, Vec<Value>)> {
        let buf = render::render_select(cx, self, opts)?;
        Ok(buf.render())
    }

    /// Execute and materialize every row.
    pub async fn fetch_all<T, C>(&self, cx: &Registry, conn: &C) -> MapResult<Vec<T>>
    where
        T: Field,
        C: GenericClient,
    {
        let (sql, params) = self.compile(cx)?;
        tracing::debug!(%sql, params = params.len(), "fetch_all");
        let rows = conn.query(&sql, &params).await?;
        crate::reader::materialize_all(cx, &rows)
    }

    /// Execute and materialize the first row, if any.
    pub async fn first_opt<T, C>(&self, cx: &Registry, conn: &C) -> MapResult<Option<T>>
    where
        T: Field,
        C: GenericClient,
    {
        let (sql, params) = self.limit(1).compile(cx)?;
        tracing::debug!(%sql, params = params.len(), "first_opt");
        match conn.query_opt(&sql, &params).await? {
            Some(row) => Ok(Some(materialize(cx, &row)?)),
            None => Ok(None),
        }
    }

    /// Execute and materialize the first row; empty results are
    /// [`MapError::NotFound`].
    pub async fn first<T, C>(&self, cx: &Registry, conn: &C) -> MapResult<T>
    where
        T: Field,
        C: GenericClient,
    {
        self.first_opt(cx, conn)
            .await?
            .ok_or_else(|| MapError::not_found(self.source.table.name.clone()))
    }

    /// Execute and materialize rows lazily as the stream is consumed.
    pub async fn fetch_stream<'a, T, C>(
        &self,
        cx: &'a Registry,
        conn: &C,
    ) -> MapResult<TypedStream<'a, T>>
    where
        T: Field,
        C: StreamingClient,
    {
        let (sql, params) = self.compile(cx)?;
        tracing::debug!(%sql, params = params.len(), "fetch_stream");
        let inner = conn.query_stream(&sql, &params).await?;
        Ok(TypedStream {
            cx,
            inner,
            _marker: PhantomData,
        })
    }
}

/// A row stream that materializes each row on demand.
#[must_use]
pub struct TypedStream<'a, T> {
    cx: &'a Registry,
    inner: RowStream,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Field> Stream for TypedStream<'_, T> {
    type Item = MapResult<T>;

    fn poll_next(self: Pin<&mut Self>, task: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(task) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(materialize(this.cx, &row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
