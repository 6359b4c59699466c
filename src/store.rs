//! Database boundary: a pooled executor behind the [`FormStore`] trait.
//!
//! Every component that needs the database receives an `Arc<dyn FormStore>`
//! from [`crate::AppState`]; tests substitute a scripted implementation.
//! Each call checks a connection out of the pool for the duration of one
//! statement and runs under the configured deadline.

use crate::error::StoreError;
use crate::sql::{bind_pg, decode_pg_row, DialectProfile, QueryBuf, TypedValue, ValueKind, POSTGRES};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "mssql")]
mod mssql;
#[cfg(feature = "mssql")]
pub use mssql::MssqlStore;

/// One decoded result row.
pub type Row = Vec<TypedValue>;

#[async_trait]
pub trait FormStore: Send + Sync {
    /// Dialect fixed when the store was opened.
    fn dialect(&self) -> &'static DialectProfile;

    /// Run a statement and decode every row following `shape`.
    async fn fetch_all(&self, query: &QueryBuf, shape: &[ValueKind]) -> Result<Vec<Row>, StoreError>;

    /// Run a statement and decode at most one row.
    async fn fetch_optional(&self, query: &QueryBuf, shape: &[ValueKind]) -> Result<Option<Row>, StoreError> {
        Ok(self.fetch_all(query, shape).await?.into_iter().next())
    }

    /// Round trip used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Abort `fut` once `timeout` elapses; dropping it returns the connection to the pool.
pub(crate) async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}

/// PostgreSQL store over a sqlx pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        PgStore { pool, timeout }
    }

    pub async fn connect(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(url)
            .await?;
        Ok(PgStore::new(pool, timeout))
    }

    fn build(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
        q.params
            .iter()
            .fold(sqlx::query(&q.sql), |query, p| bind_pg(query, p))
    }
}

#[async_trait]
impl FormStore for PgStore {
    fn dialect(&self) -> &'static DialectProfile {
        &POSTGRES
    }

    async fn fetch_all(&self, query: &QueryBuf, shape: &[ValueKind]) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = %query.sql, params = ?query.params, "query");
        let rows = with_deadline(self.timeout, async {
            Ok(Self::build(query).fetch_all(&self.pool).await?)
        })
        .await?;
        rows.iter().map(|r| decode_pg_row(r, shape)).collect()
    }

    async fn fetch_optional(&self, query: &QueryBuf, shape: &[ValueKind]) -> Result<Option<Row>, StoreError> {
        tracing::debug!(sql = %query.sql, params = ?query.params, "query");
        let row = with_deadline(self.timeout, async {
            Ok(Self::build(query).fetch_optional(&self.pool).await?)
        })
        .await?;
        row.as_ref().map(|r| decode_pg_row(r, shape)).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        with_deadline(self.timeout, async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}
