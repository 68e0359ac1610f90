//! Search query construction
//!
//! Builds the date clause from the caller's date options and combines it
//! with the reaction predicate into one search-language query string.

mod builder;
mod window;

pub use builder::{DateClause, DateRangeQueryBuilder};
pub use window::{DateRangeError, DateWindow, DATE_FORMAT};

/// Full search query: reaction predicate plus optional date clause
pub fn marker_query(marker: &str, clause: &DateClause) -> String {
    format!("has::{}: {}", marker, clause).trim().to_string()
}
