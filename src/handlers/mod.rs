//! HTTP handlers for form display, submission and listing.

pub mod forms;
pub use forms::*;
