//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown database dialect '{0}' (expected postgres or sqlserver)")]
    UnknownDialect(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failure executing a statement against the backing database.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Postgres(#[from] sqlx::Error),
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    Mssql(#[from] tiberius::error::Error),
    #[cfg(feature = "mssql")]
    #[error("connection pool: {0}")]
    Pool(String),
    #[error("query exceeded deadline of {0:?}")]
    Timeout(Duration),
    #[error("column {index}: {message}")]
    Decode { index: usize, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("schema query failed ({context}): {source}")]
    SchemaQueryFailed {
        context: String,
        #[source]
        source: StoreError,
    },
    #[error("query error, does the table {labels_table} exist? {source}")]
    MetadataQueryFailed {
        labels_table: String,
        #[source]
        source: StoreError,
    },
    #[error("unable to parse {field} as {reason}: '{raw}'")]
    ParseFailed {
        field: String,
        raw: String,
        reason: &'static str,
    },
    #[error("directory lookup failed: {0}")]
    DirectoryLookupFailed(String),
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[source] StoreError),
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

impl AppError {
    pub fn parse_failed(field: &str, raw: &str, reason: &'static str) -> Self {
        AppError::ParseFailed {
            field: field.to_string(),
            raw: raw.to_string(),
            reason,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::SchemaQueryFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            AppError::MetadataQueryFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "metadata_error"),
            AppError::ParseFailed { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            AppError::DirectoryLookupFailed(_) => (StatusCode::BAD_GATEWAY, "directory_error"),
            AppError::PersistenceFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::InvalidIdentifier(_) => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        // Server-side failures may carry statement text; log it, never return it.
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "{}", self);
            "internal error, see server log".to_string()
        } else {
            self.to_string()
        };
        let details = match &self {
            AppError::ParseFailed { field, raw, .. } => Some(serde_json::json!({ "field": field, "raw": raw })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
