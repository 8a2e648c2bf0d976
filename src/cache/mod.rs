//! Response caching for AppSearch-RS
//!
//! Caches parsed responses keyed by a canonical hash of the request. The
//! cache is owned by the client that created it. It is bounded by
//! `max_capacity` entries and, when configured, expires entries after a
//! TTL; without a TTL an entry lives until capacity pressure evicts it,
//! so a long-running process with high query cardinality will hold up to
//! `max_capacity` responses in memory.

use crate::config::CacheSettings;
use moka::future::Cache;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A stored response: status code plus parsed body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Value,
}

impl CachedResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Placeholder returned when a body cannot be parsed
    pub fn unparsed(status: u16) -> Self {
        Self {
            status,
            body: Value::Object(serde_json::Map::new()),
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cache for parsed query responses
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<String, CachedResponse>,
}

impl QueryCache {
    /// Create a new query cache with the given bound and optional TTL
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
        }
    }

    /// Create a cache from settings
    pub fn with_settings(settings: &CacheSettings) -> Self {
        Self::new(
            settings.max_capacity,
            settings.ttl_seconds.map(Duration::from_secs),
        )
    }

    /// Get a cached response
    pub async fn retrieve(&self, key: &str) -> Option<CachedResponse> {
        self.cache.get(key).await
    }

    /// Store a response
    pub async fn store(&self, key: String, response: CachedResponse) {
        self.cache.insert(key, response).await;
    }

    /// Return the cached response or run `init` once for all concurrent
    /// callers of the same key. Errors from `init` are shared with every
    /// waiting caller and nothing is stored.
    pub async fn get_or_fetch<F, E>(&self, key: String, init: F) -> Result<CachedResponse, Arc<E>>
    where
        F: Future<Output = Result<CachedResponse, E>>,
        E: Send + Sync + 'static,
    {
        self.cache.try_get_with(key, init).await
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_settings(&CacheSettings::default())
    }
}

/// Generate a cache key for a request
///
/// Object keys in `params` are hashed in sorted order at every depth, so
/// two requests that differ only in key insertion order share a key.
pub fn query_cache_key(method: &str, url: &str, params: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(url.as_bytes());
    hasher.update(canonical_json(params).as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Compact JSON with object keys sorted recursively
fn canonical_json(value: &Value) -> String {
    // Every map key of a `Value` is a string, so this cannot fail
    serde_json::to_string(&Canonical(value)).unwrap_or_else(|_| value.to_string())
}

struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(object) => {
                let sorted: BTreeMap<&String, Canonical<'_>> =
                    object.iter().map(|(k, v)| (k, Canonical(v))).collect();
                let mut map = serializer.serialize_map(Some(sorted.len()))?;
                for (key, value) in &sorted {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Canonical)),
            other => other.serialize(serializer),
        }
    }
}
