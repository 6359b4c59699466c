//! Safe SQL builder: identifiers from the catalog only, values as parameters.

mod builder;
pub mod dialect;
pub mod ident;
pub mod params;
pub use builder::*;
pub use dialect::{Dialect, DialectProfile, IdReturn, POSTGRES, SQL_SERVER};
pub use ident::{labels_table, validate_identifier, validate_type_name};
pub use params::*;
