//! Typed statement parameters and result cells, plus their sqlx (PostgreSQL) binding.

use crate::error::StoreError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};

/// How a value is bound or read. Every `TypedValue` has one, including NULL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
    Float,
    Boolean,
    Timestamp,
    Date,
}

/// A statement parameter or a decoded result cell.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<FixedOffset>),
    Date(NaiveDate),
    /// NULL of the given column kind, so backends can bind it with a concrete type.
    Null(ValueKind),
}

impl TypedValue {
    pub fn text(s: impl Into<String>) -> Self {
        TypedValue::Text(s.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Text(_) => ValueKind::Text,
            TypedValue::Integer(_) => ValueKind::Integer,
            TypedValue::Decimal(_) => ValueKind::Decimal,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Boolean(_) => ValueKind::Boolean,
            TypedValue::Timestamp(_) => ValueKind::Timestamp,
            TypedValue::Date(_) => ValueKind::Date,
            TypedValue::Null(kind) => *kind,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Text cell at `i`; NULL, missing or non-text cells read as empty.
pub fn cell_text(row: &[TypedValue], i: usize) -> String {
    row.get(i).and_then(TypedValue::as_str).unwrap_or_default().to_string()
}

/// Boolean cell at `i`; NULL, missing or non-boolean cells read as false.
pub fn cell_bool(row: &[TypedValue], i: usize) -> bool {
    row.get(i).and_then(TypedValue::as_bool).unwrap_or(false)
}

/// Bind a TypedValue to a sqlx query with its native type.
pub fn bind_pg<'q>(query: Query<'q, Postgres, PgArguments>, value: &TypedValue) -> Query<'q, Postgres, PgArguments> {
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

/// Decode one PostgreSQL row into typed cells following `shape`.
pub fn decode_pg_row(row: &PgRow, shape: &[ValueKind]) -> Result<Vec<TypedValue>, StoreError> {
    shape
        .iter()
        .enumerate()
        .map(|(i, kind)| decode_pg_cell(row, i, *kind))
        .collect()
}

fn decode_pg_cell(row: &PgRow, i: usize, kind: ValueKind) -> Result<TypedValue, StoreError> {
    let value = match kind {
        ValueKind::Text => row.try_get::<Option<String>, _>(i)?.map(TypedValue::Text),
        ValueKind::Integer => {
            if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
                v.map(TypedValue::Integer)
            } else if let Ok(v) = row.try_get::<Option<i32>, _>(i) {
                v.map(|n| TypedValue::Integer(n.into()))
            } else {
                row.try_get::<Option<i16>, _>(i)?.map(|n| TypedValue::Integer(n.into()))
            }
        }
        ValueKind::Decimal => row.try_get::<Option<Decimal>, _>(i)?.map(TypedValue::Decimal),
        ValueKind::Float => {
            if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
                v.map(TypedValue::Float)
            } else {
                row.try_get::<Option<f32>, _>(i)?.map(|f| TypedValue::Float(f.into()))
            }
        }
        ValueKind::Boolean => row.try_get::<Option<bool>, _>(i)?.map(TypedValue::Boolean),
        ValueKind::Timestamp => {
            if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(i) {
                v.map(|t| TypedValue::Timestamp(t.fixed_offset()))
            } else {
                row.try_get::<Option<NaiveDateTime>, _>(i)?
                    .map(|t| TypedValue::Timestamp(t.and_utc().fixed_offset()))
            }
        }
        ValueKind::Date => row.try_get::<Option<NaiveDate>, _>(i)?.map(TypedValue::Date),
    };
    Ok(value.unwrap_or(TypedValue::Null(kind)))
}
