//! Form handlers: show, submit, list.

use crate::error::AppError;
use crate::extractors::Identity;
use crate::response::{created, ok, rows};
use crate::schema::Form;
use crate::service::coerce::ID_KEY;
use crate::service::{Entry, FormService, SubmittedValues};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct FormView {
    pub form: Form,
    pub values: Entry,
    pub username: String,
}

#[derive(Serialize)]
pub struct SavedId {
    pub id: i64,
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::parse_failed(ID_KEY, raw, "integer"))
}

/// GET /:form
pub async fn show_form(
    State(state): State<AppState>,
    Path(form_path): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let (form, access) = FormService::open(&state, &form_path, identity.as_deref()).await?;
    Ok(ok(FormView {
        form,
        values: Entry::new(),
        username: access.username().to_string(),
    }))
}

/// GET /:form/edit/:id
pub async fn show_entry(
    State(state): State<AppState>,
    Path((form_path, id)): Path<(String, String)>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let (form, access) = FormService::open(&state, &form_path, identity.as_deref()).await?;
    let values = FormService::load_entry(&state, &form, &access, id).await?;
    Ok(ok(FormView {
        form,
        values,
        username: access.username().to_string(),
    }))
}

/// POST /:form
pub async fn submit(
    State(state): State<AppState>,
    Path(form_path): Path<String>,
    identity: Identity,
    axum::Form(pairs): axum::Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let submitted = SubmittedValues::from_pairs(pairs);
    save(&state, &form_path, identity, submitted).await
}

/// POST /:form/edit/:id; the path id overrides any submitted one.
pub async fn submit_entry(
    State(state): State<AppState>,
    Path((form_path, id)): Path<(String, String)>,
    identity: Identity,
    axum::Form(pairs): axum::Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    parse_id(&id)?;
    let mut submitted = SubmittedValues::from_pairs(pairs);
    submitted.set(ID_KEY, id);
    save(&state, &form_path, identity, submitted).await
}

async fn save(
    state: &AppState,
    form_path: &str,
    identity: Identity,
    submitted: SubmittedValues,
) -> Result<impl IntoResponse, AppError> {
    let (form, access) = FormService::open(state, form_path, identity.as_deref()).await?;
    let id = FormService::save_submission(state, &form, &access, &submitted).await?;
    Ok(created(SavedId { id }))
}

/// GET /:form/list
pub async fn list(
    State(state): State<AppState>,
    Path(form_path): Path<String>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let (form, access) = FormService::open(&state, &form_path, identity.as_deref()).await?;
    let entries = FormService::load_list(&state, &form, &access).await?;
    Ok(rows(entries))
}
