//! Form routes. Each request rebuilds the form model from the live schema.

use crate::handlers::forms::{list, show_entry, show_form, submit, submit_entry};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Upper bound on an urlencoded submission.
pub const MAX_SUBMISSION_BYTES: usize = 1024 * 1024;

pub fn form_routes(state: AppState) -> Router {
    Router::new()
        .route("/:form", get(show_form).post(submit))
        .route("/:form/list", get(list))
        .route("/:form/edit/:id", get(show_entry).post(submit_entry))
        .layer(RequestBodyLimitLayer::new(MAX_SUBMISSION_BYTES))
        .with_state(state)
}

/// Common routes plus form routes.
pub fn app(state: AppState) -> Router {
    crate::routes::common_routes_with_ready(state.clone()).merge(form_routes(state))
}
