//! FormService: authorization, value coercion and the read/write pipelines.

pub mod access;
pub mod coerce;
mod forms;
pub use access::{authorize, Access, Role, ANONYMOUS_USER};
pub use coerce::{decode, decode_submission, encode, SubmittedValues};
pub use forms::{Entry, FormService};
