//! Identifier checks for names that are concatenated into statement text.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").expect("valid identifier regex"))
}

fn type_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ (),.\[\]]{0,127}$").expect("valid type name regex"))
}

/// Catalog type names such as `bigint`, `character(10)`, `text[]` or `timestamp(3) without time zone`.
pub fn validate_type_name(name: &str) -> Result<&str, AppError> {
    if type_name_re().is_match(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}

/// Accept only plain, unquoted SQL identifiers (letters, digits, underscore).
pub fn validate_identifier(name: &str) -> Result<&str, AppError> {
    if identifier_re().is_match(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}

/// Name of the per-table labels side table.
pub fn labels_table(table: &str) -> Result<String, AppError> {
    validate_identifier(table)?;
    Ok(format!("{}_labels", table))
}
