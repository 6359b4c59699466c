//! Form models derived from the live database schema.

pub mod form;
pub mod introspect;
pub mod labels;
pub mod types;

pub use form::*;
pub use introspect::{load_columns, Column};
pub use labels::{default_label, load_field_meta, FieldMetadata};
pub use types::{map_type, untabled_type, FieldType};
