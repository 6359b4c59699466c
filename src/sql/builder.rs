//! Builds parameterized INSERT, UPDATE and SELECT statements from a form model.
//!
//! Only the table name and field names (both checked against the catalog) are
//! written into statement text; every value goes through a placeholder.

use crate::error::AppError;
use crate::schema::{Field, FieldType, Form};
use crate::service::Role;
use crate::sql::dialect::{DialectProfile, RESERVED_COLUMN_COUNT};
use crate::sql::ident::{labels_table, validate_identifier, validate_type_name};
use crate::sql::{TypedValue, ValueKind};

const NOW: &str = "CURRENT_TIMESTAMP";

/// Row shape of the forms registry query.
pub const FORM_ROW_SHAPE: &[ValueKind] = &[
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Boolean,
    ValueKind::Boolean,
];

/// Row shape of the catalog column query: name, native type, not null.
pub const COLUMN_ROW_SHAPE: &[ValueKind] = &[ValueKind::Text, ValueKind::Text, ValueKind::Boolean];

/// Row shape of the labels side-table query.
pub const LABEL_ROW_SHAPE: &[ValueKind] = &[
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Text,
    ValueKind::Boolean,
    ValueKind::Text,
    ValueKind::Boolean,
    ValueKind::Boolean,
];

/// Row shape of a statement that returns the generated id.
pub const ID_SHAPE: &[ValueKind] = &[ValueKind::Integer];

/// Statement text plus its ordered parameters.
#[derive(Clone, Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<TypedValue>,
    dialect: &'static DialectProfile,
}

impl QueryBuf {
    pub fn new(dialect: &'static DialectProfile) -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Fixed statement text without parameters.
    pub fn raw(dialect: &'static DialectProfile, sql: &str) -> Self {
        QueryBuf {
            sql: sql.to_string(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Push a parameter, returning its placeholder.
    fn push_param(&mut self, v: TypedValue) -> String {
        self.params.push(v);
        self.dialect.placeholder(self.params.len())
    }
}

/// One decoded submission value bound to its field.
#[derive(Clone, Debug)]
pub struct FieldValue<'a> {
    pub field: &'a Field,
    pub value: TypedValue,
}

/// Field name checked against the form's catalog-derived column list.
fn checked_column<'a>(form: &Form, field: &'a Field) -> Result<&'a str, AppError> {
    if form.field(&field.name).is_none() {
        return Err(AppError::InvalidIdentifier(field.name.clone()));
    }
    validate_identifier(&field.name)
}

fn select_expr(dialect: &DialectProfile, field: &Field) -> String {
    if field.column_type == FieldType::Money {
        dialect.money_column(&field.name)
    } else if field.untabled_type.is_some() {
        dialect.text_column(&field.name)
    } else {
        field.name.clone()
    }
}

/// Value expression for a field's placeholder; untabled columns take a cast where the backend needs one.
fn value_expr(dialect: &DialectProfile, field: &Field, placeholder: String) -> Result<String, AppError> {
    match &field.untabled_type {
        Some(native) => Ok(dialect.text_param(placeholder, validate_type_name(native)?)),
        None => Ok(placeholder),
    }
}

fn with_id_return(dialect: &DialectProfile, sql: String) -> String {
    match dialect.trailing_id_return() {
        Some(clause) => format!("{} {}", sql, clause),
        None => sql,
    }
}

fn inline_id_return(dialect: &DialectProfile) -> String {
    dialect
        .inline_id_return()
        .map(|clause| format!(" {}", clause))
        .unwrap_or_default()
}

/// Registry lookup by form path.
pub fn form_row(dialect: &'static DialectProfile, path: &str) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    let ph = q.push_param(TypedValue::text(path));
    q.sql = format!(
        "SELECT name, description, table_name, admins, allow_anonymous, use_directory_fields FROM forms WHERE path = {}",
        ph
    );
    q
}

/// Catalog columns of `table`, skipping the reserved leading columns.
pub fn catalog_columns(dialect: &'static DialectProfile, table: &str) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    q.push_param(TypedValue::text(table));
    q.push_param(TypedValue::Integer(RESERVED_COLUMN_COUNT));
    q.sql = dialect.catalog_columns_sql.to_string();
    q
}

/// Labels side-table row for one column.
pub fn label_row(dialect: &'static DialectProfile, table: &str, column: &str) -> Result<QueryBuf, AppError> {
    let labels = labels_table(table)?;
    let mut q = QueryBuf::new(dialect);
    let ph = q.push_param(TypedValue::text(column));
    q.sql = format!(
        "SELECT label, description, placeholder, options, options_as_radio, section_heading, linebreak_after, include_in_summary FROM {} WHERE column_name = {}",
        labels, ph
    );
    Ok(q)
}

/// INSERT of one submission. Placeholder 1 is the owner; field placeholders follow in field order.
pub fn insert(
    dialect: &'static DialectProfile,
    form: &Form,
    owner: &str,
    values: &[FieldValue<'_>],
) -> Result<QueryBuf, AppError> {
    let table = validate_identifier(&form.table_name)?;
    let mut q = QueryBuf::new(dialect);
    let mut cols = vec!["created_ts".to_string(), "updated_ts".to_string(), "created_user".to_string()];
    let mut placeholders = vec![NOW.to_string(), NOW.to_string()];
    placeholders.push(q.push_param(TypedValue::text(owner)));
    for fv in values {
        cols.push(checked_column(form, fv.field)?.to_string());
        let ph = q.push_param(fv.value.clone());
        placeholders.push(value_expr(dialect, fv.field, ph)?);
    }
    let sql = format!(
        "INSERT INTO {} ({}){} VALUES ({})",
        table,
        cols.join(", "),
        inline_id_return(dialect),
        placeholders.join(", ")
    );
    q.sql = with_id_return(dialect, sql);
    Ok(q)
}

/// UPDATE of one row. Placeholder 1 is the id, 2 the owner, fields follow.
/// Directory-populated fields are never written after insert and take no placeholder.
/// Admins get the always-true `<owner> <> ''` check so both roles bind the same leading parameters.
pub fn update(
    dialect: &'static DialectProfile,
    form: &Form,
    role: Role,
    id: i64,
    owner: &str,
    values: &[FieldValue<'_>],
) -> Result<QueryBuf, AppError> {
    let table = validate_identifier(&form.table_name)?;
    let mut q = QueryBuf::new(dialect);
    let id_ph = q.push_param(TypedValue::Integer(id));
    let owner_ph = q.push_param(TypedValue::text(owner));
    let mut sets = vec![format!("updated_ts = {}", NOW)];
    for fv in values.iter().filter(|fv| !fv.field.is_directory_populated) {
        let col = checked_column(form, fv.field)?;
        let ph = q.push_param(fv.value.clone());
        sets.push(format!("{} = {}", col, value_expr(dialect, fv.field, ph)?));
    }
    let ownership = match role {
        Role::Admin => format!("{} <> ''", owner_ph),
        Role::Owner => format!("created_user = {}", owner_ph),
    };
    let sql = format!(
        "UPDATE {} SET {}{} WHERE id = {} AND {}",
        table,
        sets.join(", "),
        inline_id_return(dialect),
        id_ph,
        ownership
    );
    q.sql = with_id_return(dialect, sql);
    Ok(q)
}

fn select_columns<'a>(
    dialect: &DialectProfile,
    form: &Form,
    fields: impl Iterator<Item = &'a Field>,
) -> Result<(Vec<String>, Vec<ValueKind>), AppError> {
    let mut cols = vec!["id".to_string(), "created_user".to_string(), "created_ts".to_string()];
    let mut shape = vec![ValueKind::Integer, ValueKind::Text, ValueKind::Timestamp];
    for field in fields {
        checked_column(form, field)?;
        cols.push(select_expr(dialect, field));
        shape.push(field.column_type.value_kind());
    }
    Ok((cols, shape))
}

/// Summary list: `id, created_user, created_ts` plus summary fields, newest first.
/// Returns the statement and the row shape.
pub fn select_list(
    dialect: &'static DialectProfile,
    form: &Form,
    role: Role,
    owner: &str,
) -> Result<(QueryBuf, Vec<ValueKind>), AppError> {
    let table = validate_identifier(&form.table_name)?;
    let (cols, shape) = select_columns(dialect, form, form.summary_fields())?;
    let mut q = QueryBuf::new(dialect);
    let where_clause = match role {
        Role::Admin => String::new(),
        Role::Owner => format!(" WHERE created_user = {}", q.push_param(TypedValue::text(owner))),
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY created_ts DESC",
        cols.join(", "),
        table,
        where_clause
    );
    Ok((q, shape))
}

/// Single row by id with every field.
pub fn select_entry(
    dialect: &'static DialectProfile,
    form: &Form,
    role: Role,
    owner: &str,
    id: i64,
) -> Result<(QueryBuf, Vec<ValueKind>), AppError> {
    let table = validate_identifier(&form.table_name)?;
    let (cols, shape) = select_columns(dialect, form, form.fields.iter())?;
    let mut q = QueryBuf::new(dialect);
    let mut where_clause = format!("id = {}", q.push_param(TypedValue::Integer(id)));
    if role == Role::Owner {
        where_clause.push_str(&format!(" AND created_user = {}", q.push_param(TypedValue::text(owner))));
    }
    q.sql = format!("SELECT {} FROM {} WHERE {}", cols.join(", "), table, where_clause);
    Ok((q, shape))
}
