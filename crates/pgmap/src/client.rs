//! Generic client trait for unified database access.
//!
//! Compiled statements execute through [`GenericClient`], which unifies direct
//! connections and transactions; parameters travel as [`Value`] slices so the
//! executor never sees driver-specific binding. Streaming consumption goes
//! through the separate [`StreamingClient`] trait.

use crate::error::{MapError, MapResult};
use crate::value::Value;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

fn bind(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// A trait that unifies database clients and transactions.
///
/// Repository-level code can accept either a direct connection or a
/// transaction and compose operations across both.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<Vec<Row>>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a query and return the first row.
    ///
    /// Returns [`MapError::NotFound`] when the result set is empty; extra
    /// rows are ignored, not an error.
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| MapError::not_found("expected one row, got none"))
        }
    }

    /// Execute a statement and return the affected row count.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<u64>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> MapResult<Vec<Row>> {
        let params = bind(params);
        Ok(tokio_postgres::Client::query(self, sql, &params).await?)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> MapResult<u64> {
        let params = bind(params);
        Ok(tokio_postgres::Client::execute(self, sql, &params).await?)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> MapResult<Vec<Row>> {
        let params = bind(params);
        Ok(tokio_postgres::Transaction::query(self, sql, &params).await?)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> MapResult<u64> {
        let params = bind(params);
        Ok(tokio_postgres::Transaction::execute(self, sql, &params).await?)
    }
}

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}

/// A stream of database rows.
///
/// Type-erased so different client implementations can return a uniform
/// streaming type.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = MapResult<Row>> + Send>>,
}

impl RowStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = MapResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = MapResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Streaming query support.
///
/// Separate from [`GenericClient`] so only clients that can stream rows
/// without buffering (via `query_raw`) need to implement it.
pub trait StreamingClient: GenericClient {
    /// Execute a query and return a [`RowStream`] for incremental consumption.
    fn query_stream(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = MapResult<RowStream>> + Send;
}

struct DriverRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> DriverRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for DriverRowStream<S>
where
    S: Stream<Item = Result<Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = MapResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(MapError::Db(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> MapResult<RowStream> {
        let params = bind(params);
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter().copied()).await?;
        Ok(RowStream::new(DriverRowStream::new(stream)))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> MapResult<RowStream> {
        let params = bind(params);
        let stream =
            tokio_postgres::Transaction::query_raw(self, sql, params.iter().copied()).await?;
        Ok(RowStream::new(DriverRowStream::new(stream)))
    }
}
