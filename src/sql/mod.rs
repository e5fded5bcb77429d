pub mod clause;
pub mod error;

pub use clause::{set_clause, where_clause, FilterCond, SqlFragment};
pub use error::ClauseError;
