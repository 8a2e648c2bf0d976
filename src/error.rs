//! Error types for AppSearch-RS
//!
//! Every fallible operation in the library returns [`Error`]. Body-parse
//! failures are not errors: the executor recovers them as an empty body.

use std::sync::Arc;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all client operations
///
/// The type is `Clone` so that a single failure can be handed to every
/// caller waiting on a coalesced request.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The service answered with a non-success status
    #[error("[{status}]{}", format_errors(.message))]
    Http { status: u16, message: Option<String> },

    /// The transport collaborator failed before a response was available
    #[error("transport error: {0}")]
    Transport(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A filter expression could not be interpreted
    #[error("malformed filter at {path}: {reason}")]
    MalformedFilter { path: String, reason: String },

    /// The caller supplied an option combination the client refuses
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A successful response did not have the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Settings are incomplete or inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Request parameters could not be serialized
    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),
}

fn format_errors(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(" {}", m),
        _ => String::new(),
    }
}

impl Error {
    /// Wrap any transport failure
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport(Arc::new(err))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::transport(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}
