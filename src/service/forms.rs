//! Submission, list and single-entry pipelines over a [`FormStore`](crate::store::FormStore).

use crate::error::{AppError, StoreError};
use crate::schema::{load_form, load_form_header, Field, FieldType, Form};
use crate::service::coerce::{decode_submission, encode, encode_field, SubmittedValues, ID_KEY};
use crate::service::{authorize, Access};
use crate::sql::{insert, select_entry, select_list, update, TypedValue, ID_SHAPE};
use crate::state::AppState;
use std::collections::BTreeMap;

/// One row encoded to display strings, keyed by column name.
pub type Entry = BTreeMap<String, String>;

pub struct FormService;

impl FormService {
    /// Registry row, then authorization, then the catalog. A rejected caller costs one query.
    pub async fn open(state: &AppState, path: &str, identity: Option<&str>) -> Result<(Form, Access), AppError> {
        let store = state.store.as_ref();
        let header = load_form_header(store, path).await?;
        let access = authorize(identity, &header)?;
        let form = load_form(store, header, state.directory.is_some()).await?;
        Ok((form, access))
    }

    /// Insert or update one submission; returns the row id.
    pub async fn save_submission(
        state: &AppState,
        form: &Form,
        access: &Access,
        submitted: &SubmittedValues,
    ) -> Result<i64, AppError> {
        let store = state.store.as_ref();
        let id = submitted
            .id()
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::parse_failed(ID_KEY, raw, "integer"))
            })
            .transpose()?;

        let attrs = match (&state.directory, form.use_directory_fields && id.is_none()) {
            (Some(directory), true) => Some(directory.lookup_identity(access.username()).await?),
            _ => None,
        };
        let values = decode_submission(form, submitted, id.is_none(), attrs.as_ref())?;

        let q = match id {
            None => insert(store.dialect(), form, access.username(), &values)?,
            Some(id) => update(store.dialect(), form, access.role(), id, access.username(), &values)?,
        };
        let row = store
            .fetch_optional(&q, ID_SHAPE)
            .await
            .map_err(AppError::PersistenceFailed)?;
        let saved = row.as_ref().and_then(|r| r.first()).and_then(TypedValue::as_i64);
        match (saved, id) {
            (Some(saved), _) => {
                tracing::info!(form = %form.name, id = saved, user = %access.username(), "saved submission");
                Ok(saved)
            }
            (None, Some(id)) => Err(AppError::NotFound(format!("entry {} of form {}", id, form.name))),
            (None, None) => Err(AppError::PersistenceFailed(StoreError::Decode {
                index: 0,
                message: "insert returned no id".into(),
            })),
        }
    }

    /// Summary rows visible to the caller, newest first.
    pub async fn load_list(state: &AppState, form: &Form, access: &Access) -> Result<Vec<Entry>, AppError> {
        let store = state.store.as_ref();
        let (q, shape) = select_list(store.dialect(), form, access.role(), access.username())?;
        let rows = store.fetch_all(&q, &shape).await.map_err(AppError::PersistenceFailed)?;
        Ok(rows.iter().map(|row| encode_row(row, form.summary_fields())).collect())
    }

    /// Every field of one row; a missing or foreign row is `NotFound`.
    pub async fn load_entry(state: &AppState, form: &Form, access: &Access, id: i64) -> Result<Entry, AppError> {
        let store = state.store.as_ref();
        let (q, shape) = select_entry(store.dialect(), form, access.role(), access.username(), id)?;
        let row = store
            .fetch_optional(&q, &shape)
            .await
            .map_err(AppError::PersistenceFailed)?
            .ok_or_else(|| AppError::NotFound(format!("entry {} of form {}", id, form.name)))?;
        Ok(encode_row(&row, form.fields.iter()))
    }
}

/// Rows start with `id, created_user, created_ts`, then one cell per field.
fn encode_row<'a>(row: &[TypedValue], fields: impl Iterator<Item = &'a Field>) -> Entry {
    let mut entry = Entry::new();
    let leading = [("id", FieldType::Integer), ("created_user", FieldType::VarChar), ("created_ts", FieldType::Timestamp)];
    for (i, (name, ty)) in leading.into_iter().enumerate() {
        entry.insert(name.to_string(), row.get(i).map(|v| encode(ty, v)).unwrap_or_default());
    }
    for (field, value) in fields.zip(row.iter().skip(leading.len())) {
        entry.insert(field.name.clone(), encode_field(field, value));
    }
    entry
}
