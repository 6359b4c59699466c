//! dynform: web forms derived at request time from live database schema metadata.

pub mod config;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_config, AppConfig};
pub use directory::{Directory, IdentityAttributes, StaticDirectory};
pub use error::{AppError, ConfigError, StoreError};
pub use routes::{app, common_routes_with_ready, form_routes};
pub use schema::{Field, FieldType, Form};
pub use service::{Access, FormService, Role, SubmittedValues};
pub use sql::{Dialect, DialectProfile};
pub use state::AppState;
pub use store::{FormStore, PgStore};
