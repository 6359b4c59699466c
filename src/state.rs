//! Shared application state for all routes, built once at startup.

use crate::directory::Directory;
use crate::store::FormStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Pooled store; its dialect is fixed for the process lifetime.
    pub store: Arc<dyn FormStore>,
    /// `None` disables directory-populated fields on every form.
    pub directory: Option<Arc<dyn Directory>>,
}

impl AppState {
    pub fn new(store: Arc<dyn FormStore>, directory: Option<Arc<dyn Directory>>) -> Self {
        AppState { store, directory }
    }
}
