//! Submitted strings to typed parameters, and stored values back to display strings.

use crate::directory::IdentityAttributes;
use crate::error::AppError;
use crate::schema::{Field, FieldType, Form};
use crate::sql::{FieldValue, TypedValue, ValueKind};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::str::FromStr;

/// Reserved submission key: present and non-empty means update.
pub const ID_KEY: &str = "id";
/// Reserved submission key: client offset in minutes west of UTC.
pub const TZ_OFFSET_KEY: &str = "timezone-offset";

/// Layout of timestamps handed back to forms (`datetime-local`).
pub const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";
pub const DATE_LOCAL: &str = "%Y-%m-%d";

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M%:z", "%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Offsets at or beyond a full day cannot be represented.
const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// Key/value form submission. Only the first value of a repeated key counts.
#[derive(Clone, Debug, Default)]
pub struct SubmittedValues {
    values: HashMap<String, String>,
}

impl SubmittedValues {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (k, v) in pairs {
            values.entry(k.into()).or_insert_with(|| v.into());
        }
        SubmittedValues { values }
    }

    /// Value for `key`; missing keys read as empty.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    /// Replace a value, e.g. the id taken from the request path.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        Some(self.get(ID_KEY)).filter(|s| !s.is_empty())
    }

    pub fn timezone_offset(&self) -> &str {
        self.get(TZ_OFFSET_KEY)
    }
}

/// `+HH:MM` / `-HH:MM` for a client offset in minutes west of UTC.
/// Anything unparseable falls back to UTC.
pub fn tz_offset_suffix(minutes_west: &str) -> String {
    match minutes_west.trim().parse::<i32>() {
        Ok(m) if (1 - MAX_OFFSET_MINUTES..MAX_OFFSET_MINUTES).contains(&m) => {
            let sign = if m <= 0 { '+' } else { '-' };
            let minutes = m.unsigned_abs();
            format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
        }
        Ok(m) => {
            tracing::warn!(offset = m, "timezone offset out of range, saving as UTC");
            "+00:00".to_string()
        }
        Err(e) => {
            tracing::warn!(offset = %minutes_west, error = %e, "unable to parse timezone offset, saving as UTC");
            "+00:00".to_string()
        }
    }
}

/// `2024-06-01T09:00` with offset `-60` -> `2024-06-01 09:00+01:00`.
pub fn timestamp_text(raw: &str, minutes_west: &str) -> String {
    format!("{}{}", raw.replace('T', " "), tz_offset_suffix(minutes_west))
}

fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)).ok()
}

/// Type values are bound as: option lists bind with their column's type.
fn storage_type(field: &Field) -> FieldType {
    if field.field_type.has_options() {
        field.column_type
    } else {
        field.field_type
    }
}

/// Decode one submitted value for `field`.
pub fn decode(field: &Field, raw: &str, minutes_west: &str) -> Result<TypedValue, AppError> {
    let ty = storage_type(field);
    if ty == FieldType::Boolean {
        return Ok(TypedValue::Boolean(raw == "1"));
    }
    if raw.is_empty() && !field.required {
        return Ok(TypedValue::Null(ty.value_kind()));
    }
    let name = field.name.as_str();
    match ty {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|_| AppError::parse_failed(name, raw, "integer")),
        FieldType::Decimal => parse_decimal(raw)
            .map(TypedValue::Decimal)
            .ok_or_else(|| AppError::parse_failed(name, raw, "decimal")),
        FieldType::Money => parse_decimal(raw)
            .map(TypedValue::Decimal)
            .ok_or_else(|| AppError::parse_failed(name, raw, "money")),
        FieldType::Float => raw
            .parse::<f64>()
            .map(TypedValue::Float)
            .map_err(|_| AppError::parse_failed(name, raw, "float")),
        FieldType::Timestamp => parse_timestamp(&timestamp_text(raw, minutes_west))
            .map(TypedValue::Timestamp)
            .ok_or_else(|| AppError::parse_failed(name, raw, "timestamp")),
        FieldType::Date => NaiveDate::parse_from_str(raw, DATE_LOCAL)
            .map(TypedValue::Date)
            .map_err(|_| AppError::parse_failed(name, raw, "date")),
        _ => Ok(TypedValue::text(raw)),
    }
}

/// Directory values are used as given; non-text columns still need a typed parameter.
fn decode_directory_value(field: &Field, raw: &str) -> Result<TypedValue, AppError> {
    match storage_type(field).value_kind() {
        ValueKind::Text => Ok(TypedValue::text(raw)),
        _ => {
            let optional = Field {
                required: false,
                ..field.clone()
            };
            decode(&optional, raw, "0")
        }
    }
}

/// Display string for a stored value. Never fails.
pub fn encode(field_type: FieldType, value: &TypedValue) -> String {
    match value {
        TypedValue::Null(_) => String::new(),
        TypedValue::Text(s) => s.clone(),
        TypedValue::Integer(n) => n.to_string(),
        TypedValue::Decimal(d) if field_type == FieldType::Money => {
            let mut fixed = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            fixed.rescale(2);
            fixed.to_string()
        }
        TypedValue::Decimal(d) => d.to_string(),
        TypedValue::Float(f) => f.to_string(),
        TypedValue::Boolean(true) => "1".to_string(),
        TypedValue::Boolean(false) => String::new(),
        TypedValue::Timestamp(t) => t.format(DATETIME_LOCAL).to_string(),
        TypedValue::Date(d) => d.format(DATE_LOCAL).to_string(),
    }
}

/// Encode a stored value for `field` using its column type.
pub fn encode_field(field: &Field, value: &TypedValue) -> String {
    encode(field.column_type, value)
}

/// Decode every field of `form` from a submission.
///
/// On insert, directory-populated fields take their value from `directory` and
/// ignore the submission; on update they are left out entirely.
pub fn decode_submission<'a>(
    form: &'a Form,
    submitted: &SubmittedValues,
    is_insert: bool,
    directory: Option<&IdentityAttributes>,
) -> Result<Vec<FieldValue<'a>>, AppError> {
    let tz = submitted.timezone_offset();
    let mut out = Vec::with_capacity(form.fields.len());
    for field in &form.fields {
        let value = if field.is_directory_populated {
            if !is_insert {
                continue;
            }
            let attrs = directory.ok_or_else(|| {
                AppError::DirectoryLookupFailed(format!("no directory attributes for field {}", field.name))
            })?;
            decode_directory_value(field, attrs.get(&field.name).unwrap_or(""))?
        } else {
            decode(field, submitted.get(&field.name), tz)?
        };
        out.push(FieldValue { field, value });
    }
    Ok(out)
}
