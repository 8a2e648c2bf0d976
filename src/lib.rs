//! AppSearch-RS: an App Search client written in Rust
//!
//! Issues search, multi-search and click requests against an App Search
//! engine, computes disjunctive facet counts with parallel auxiliary
//! queries, and caches responses per client.

pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod network;
pub mod results;
pub mod search;

pub use config::Settings;
pub use error::{Error, Result};
pub use filters::Filters;
pub use results::{ResultItem, ResultList};
pub use search::{Client, ClickEvent, SearchOptions, SearchRequest};

/// Library version, reported in the client version header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for API requests in seconds
pub const DEFAULT_TIMEOUT: f64 = 5.0;
