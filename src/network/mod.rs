//! HTTP networking module
//!
//! Provides the transport seam, the reqwest-backed client and the caching
//! request executor.

mod client;
mod executor;
mod headers;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpClient;
pub use executor::Executor;
pub use headers::{client_headers, CLIENT_NAME};
pub use traits::*;
