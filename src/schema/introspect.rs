//! Catalog introspection of a form table's columns.

use crate::error::AppError;
use crate::sql::{catalog_columns, cell_bool, cell_text, COLUMN_ROW_SHAPE};
use crate::store::FormStore;

/// One catalog column, consumed immediately by the form builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub native_type: String,
    pub not_null: bool,
}

/// Columns of `table` in ordinal order, reserved leading columns skipped.
/// An unknown table yields an empty list.
pub async fn load_columns(store: &dyn FormStore, table: &str) -> Result<Vec<Column>, AppError> {
    let q = catalog_columns(store.dialect(), table);
    let rows = store
        .fetch_all(&q, COLUMN_ROW_SHAPE)
        .await
        .map_err(|source| AppError::SchemaQueryFailed {
            context: format!("unable to query table metadata for {}", table),
            source,
        })?;
    Ok(rows
        .iter()
        .map(|row| Column {
            name: cell_text(row, 0),
            native_type: cell_text(row, 1),
            not_null: cell_bool(row, 2),
        })
        .collect())
}
