//! Filter expression trees
//!
//! App Search filters are JSON objects whose keys are either field names
//! (leaf conditions) or one of the `all` / `any` / `none` combinators, each
//! holding a list of nested filter objects. [`Filters`] is the parsed form
//! of one such object.

mod tree;

pub use tree::{Combinator, FilterEntry, Filters};
