//! The per-request form aggregate and its builder.

use crate::directory::is_directory_field;
use crate::error::AppError;
use crate::schema::{load_columns, load_field_meta, map_type, untabled_type, FieldType};
use crate::sql::{cell_bool, cell_text, form_row, validate_identifier, validate_type_name, FORM_ROW_SHAPE};
use crate::store::FormStore;
use serde::Serialize;
use std::collections::BTreeSet;

/// One input bound to one table column.
#[derive(Clone, Debug, Serialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Type of the backing column; differs from `field_type` when options turn it into a Select or Radio.
    #[serde(skip)]
    pub column_type: FieldType,
    /// Catalog type name when the type table had no entry for it.
    #[serde(skip)]
    pub untabled_type: Option<String>,
    pub required: bool,
    pub label: String,
    pub description: String,
    pub placeholder: String,
    pub options: Vec<String>,
    pub section_heading: String,
    pub linebreak_after: bool,
    pub include_in_summary: bool,
    pub is_directory_populated: bool,
}

/// Registry row for a form path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormHeader {
    pub path: String,
    pub name: String,
    pub description: String,
    pub table_name: String,
    pub admins: BTreeSet<String>,
    pub allow_anonymous: bool,
    pub use_directory_fields: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Form {
    pub name: String,
    pub description: String,
    pub table_name: String,
    pub fields: Vec<Field>,
    #[serde(skip)]
    pub admins: BTreeSet<String>,
    pub allow_anonymous: bool,
    pub use_directory_fields: bool,
}

impl Form {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields shown in the list view.
    pub fn summary_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.include_in_summary)
    }
}

/// Comma-separated usernames, trimmed; empty entries ignored.
pub fn parse_admins(admins: &str) -> BTreeSet<String> {
    admins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Look up the registry row for `path`.
pub async fn load_form_header(store: &dyn FormStore, path: &str) -> Result<FormHeader, AppError> {
    let q = form_row(store.dialect(), path);
    let row = store
        .fetch_optional(&q, FORM_ROW_SHAPE)
        .await
        .map_err(|source| AppError::SchemaQueryFailed {
            context: format!("unable to load form {}", path),
            source,
        })?
        .ok_or_else(|| AppError::NotFound(format!("form {}", path)))?;
    Ok(FormHeader {
        path: path.to_string(),
        name: cell_text(&row, 0),
        description: cell_text(&row, 1),
        table_name: cell_text(&row, 2),
        admins: parse_admins(&cell_text(&row, 3)),
        allow_anonymous: cell_bool(&row, 4),
        use_directory_fields: cell_bool(&row, 5),
    })
}

/// Build the field list for `header` from the catalog and the labels table.
/// Directory fields are disabled when no directory is configured, whatever the registry says.
pub async fn load_form(store: &dyn FormStore, header: FormHeader, directory_configured: bool) -> Result<Form, AppError> {
    validate_identifier(&header.table_name)?;
    let use_directory_fields = header.use_directory_fields && directory_configured;
    if header.use_directory_fields && !directory_configured {
        tracing::warn!(form = %header.path, "directory fields requested but no directory configured");
    }

    let columns = load_columns(store, &header.table_name).await?;
    let mut fields = Vec::with_capacity(columns.len());
    for column in columns {
        validate_identifier(&column.name)?;
        let meta = load_field_meta(store, &header.table_name, &column.name).await?;
        let column_type = map_type(&column.native_type, store.dialect());
        let untabled_type = untabled_type(&column.native_type, store.dialect());
        if let Some(native) = &untabled_type {
            validate_type_name(native)?;
            tracing::debug!(column = %column.name, native = %native, "column type not in type table, using text");
        }
        let field_type = meta.field_type_override().unwrap_or(column_type);
        let is_directory_populated = use_directory_fields && is_directory_field(&column.name);
        fields.push(Field {
            name: column.name,
            field_type,
            column_type,
            untabled_type,
            required: column.not_null,
            label: meta.label,
            description: meta.description,
            placeholder: meta.placeholder,
            options: meta.options,
            section_heading: meta.section_heading,
            linebreak_after: meta.linebreak_after,
            include_in_summary: meta.include_in_summary,
            is_directory_populated,
        });
    }

    Ok(Form {
        name: header.name,
        description: header.description,
        table_name: header.table_name,
        fields,
        admins: header.admins,
        allow_anonymous: header.allow_anonymous,
        use_directory_fields,
    })
}
