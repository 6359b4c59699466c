//! Semantic field types and the native-type mapping.

use crate::sql::{DialectProfile, ValueKind};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    VarChar,
    Integer,
    Decimal,
    Money,
    Float,
    Boolean,
    Select,
    Radio,
    Timestamp,
    Date,
}

impl FieldType {
    /// Kind used to bind and read values of this field.
    pub fn value_kind(self) -> ValueKind {
        match self {
            FieldType::Text | FieldType::VarChar | FieldType::Select | FieldType::Radio => ValueKind::Text,
            FieldType::Integer => ValueKind::Integer,
            FieldType::Decimal | FieldType::Money => ValueKind::Decimal,
            FieldType::Float => ValueKind::Float,
            FieldType::Boolean => ValueKind::Boolean,
            FieldType::Timestamp => ValueKind::Timestamp,
            FieldType::Date => ValueKind::Date,
        }
    }

    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

/// Lower-case, trim and drop a parenthesised type modifier: `numeric(10,2)` -> `numeric`,
/// `timestamp(3) with time zone` -> `timestamp with time zone`.
fn normalize_native_type(native: &str) -> String {
    let lower = native.trim().to_lowercase();
    let stripped = match (lower.find('('), lower.find(')')) {
        (Some(open), Some(close)) if close > open => format!("{}{}", &lower[..open], &lower[close + 1..]),
        _ => lower,
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a catalog type name to a field type. Unknown names fall back to VarChar.
pub fn map_type(native: &str, dialect: &DialectProfile) -> FieldType {
    dialect
        .lookup_type(&normalize_native_type(native))
        .unwrap_or(FieldType::VarChar)
}

/// The catalog type name, trimmed, when it has no entry in the dialect's table.
/// Such columns map to VarChar and are read and written as text.
pub fn untabled_type(native: &str, dialect: &DialectProfile) -> Option<String> {
    match dialect.lookup_type(&normalize_native_type(native)) {
        Some(_) => None,
        None => Some(native.trim().to_string()),
    }
}
