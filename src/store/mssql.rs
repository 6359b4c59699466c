//! SQL Server store over a bb8 pool of tiberius clients.

use super::{with_deadline, FormStore, Row};
use crate::error::StoreError;
use crate::sql::{DialectProfile, QueryBuf, TypedValue, ValueKind, SQL_SERVER};
use async_trait::async_trait;
use bb8::Pool;
use bb8_tiberius::ConnectionManager;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Clone)]
pub struct MssqlStore {
    pool: Pool<ConnectionManager>,
    timeout: Duration,
}

impl MssqlStore {
    /// Connect with an ADO.NET style connection string.
    pub async fn connect(conn_str: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let manager = ConnectionManager::build(conn_str)?;
        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(timeout)
            .build(manager)
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(MssqlStore { pool, timeout })
    }

    async fn run(&self, q: &QueryBuf, shape: &[ValueKind]) -> Result<Vec<Row>, StoreError> {
        let mut conn = self.pool.get().await.map_err(|e| StoreError::Pool(e.to_string()))?;
        let mut query = tiberius::Query::new(q.sql.as_str());
        for p in &q.params {
            bind(&mut query, p);
        }
        let rows = query.query(&mut *conn).await?.into_first_result().await?;
        rows.iter()
            .map(|row| {
                shape
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| decode_cell(row, i, *kind))
                    .collect()
            })
            .collect()
    }
}

fn bind(query: &mut tiberius::Query<'_>, value: &TypedValue) {
    match value {
        TypedValue::Text(s) => query.bind(s.clone()),
        TypedValue::Integer(n) => query.bind(*n),
        TypedValue::Decimal(d) => query.bind(*d),
        TypedValue::Float(f) => query.bind(*f),
        TypedValue::Boolean(b) => query.bind(*b),
        TypedValue::Timestamp(t) => query.bind(*t),
        TypedValue::Date(d) => query.bind(*d),
        TypedValue::Null(kind) => match kind {
            ValueKind::Text => query.bind(Option::<String>::None),
            ValueKind::Integer => query.bind(Option::<i64>::None),
            ValueKind::Decimal => query.bind(Option::<Decimal>::None),
            ValueKind::Float => query.bind(Option::<f64>::None),
            ValueKind::Boolean => query.bind(Option::<bool>::None),
            ValueKind::Timestamp => query.bind(Option::<DateTime<FixedOffset>>::None),
            ValueKind::Date => query.bind(Option::<NaiveDate>::None),
        },
    }
}

fn decode_cell(row: &tiberius::Row, i: usize, kind: ValueKind) -> Result<TypedValue, StoreError> {
    let value = match kind {
        ValueKind::Text => row.try_get::<&str, _>(i)?.map(TypedValue::text),
        ValueKind::Integer => {
            if let Ok(v) = row.try_get::<i64, _>(i) {
                v.map(TypedValue::Integer)
            } else if let Ok(v) = row.try_get::<i32, _>(i) {
                v.map(|n| TypedValue::Integer(n.into()))
            } else {
                row.try_get::<i16, _>(i)?.map(|n| TypedValue::Integer(n.into()))
            }
        }
        ValueKind::Decimal => row.try_get::<Decimal, _>(i)?.map(TypedValue::Decimal),
        ValueKind::Float => {
            if let Ok(v) = row.try_get::<f64, _>(i) {
                v.map(TypedValue::Float)
            } else {
                row.try_get::<f32, _>(i)?.map(|f| TypedValue::Float(f.into()))
            }
        }
        ValueKind::Boolean => row.try_get::<bool, _>(i)?.map(TypedValue::Boolean),
        ValueKind::Timestamp => {
            if let Ok(v) = row.try_get::<DateTime<FixedOffset>, _>(i) {
                v.map(TypedValue::Timestamp)
            } else {
                row.try_get::<NaiveDateTime, _>(i)?
                    .map(|t| TypedValue::Timestamp(t.and_utc().fixed_offset()))
            }
        }
        ValueKind::Date => row.try_get::<NaiveDate, _>(i)?.map(TypedValue::Date),
    };
    Ok(value.unwrap_or(TypedValue::Null(kind)))
}

#[async_trait]
impl FormStore for MssqlStore {
    fn dialect(&self) -> &'static DialectProfile {
        &SQL_SERVER
    }

    async fn fetch_all(&self, query: &QueryBuf, shape: &[ValueKind]) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = %query.sql, params = ?query.params, "query");
        with_deadline(self.timeout, self.run(query, shape)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let q = QueryBuf::raw(&SQL_SERVER, "SELECT 1");
        with_deadline(self.timeout, self.run(&q, &[])).await.map(|_| ())
    }
}
