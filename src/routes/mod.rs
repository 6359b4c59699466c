pub mod common;
pub mod forms;
pub use common::*;
pub use forms::*;
