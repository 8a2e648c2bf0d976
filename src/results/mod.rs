//! Result types for search responses
//!
//! Wraps raw response JSON into a [`ResultList`] of [`ResultItem`]s.

mod list;
mod types;

pub use list::ResultList;
pub use types::*;
