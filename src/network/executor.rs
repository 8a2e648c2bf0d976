//! Request execution with optional response caching

use super::traits::{ApiRequest, HttpMethod, Transport};
use crate::cache::{query_cache_key, CachedResponse, QueryCache};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a fetch produced nothing to store
#[derive(Debug)]
enum Uncached {
    /// Body was not JSON; the caller gets an empty-body placeholder
    Unparsed(u16),
    Failed(Error),
}

/// Issues API requests relative to one endpoint and caches parsed responses
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    api_endpoint: String,
    headers: HashMap<String, String>,
}

impl Executor {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: QueryCache,
        api_endpoint: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            transport,
            cache,
            api_endpoint: api_endpoint.into(),
            headers,
        }
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Send `params` to `path` and return the status with the parsed body
    ///
    /// With `cache_responses`, a stored response for the same method, URL
    /// and parameters is returned without touching the network, and
    /// concurrent identical requests share one network call. Responses
    /// whose body is not JSON come back with an empty body and are never
    /// stored.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Value,
        cache_responses: bool,
    ) -> Result<CachedResponse> {
        let url = format!("{}{}", self.api_endpoint, path);

        if !cache_responses {
            return match self.fetch(method, &url, params).await {
                Ok(response) => Ok(response),
                Err(Uncached::Unparsed(status)) => Ok(CachedResponse::unparsed(status)),
                Err(Uncached::Failed(e)) => Err(e),
            };
        }

        let key = query_cache_key(method.as_str(), &url, params);
        if let Some(hit) = self.cache.retrieve(&key).await {
            debug!("Cache hit for {} {}", method.as_str(), url);
            return Ok(hit);
        }

        let fetched = self
            .cache
            .get_or_fetch(key, async {
                debug!("Cache miss for {} {}", method.as_str(), url);
                self.fetch(method, &url, params).await
            })
            .await;

        match fetched {
            Ok(response) => Ok(response),
            Err(uncached) => match uncached.as_ref() {
                Uncached::Unparsed(status) => Ok(CachedResponse::unparsed(*status)),
                Uncached::Failed(e) => Err(e.clone()),
            },
        }
    }

    async fn fetch(
        &self,
        method: HttpMethod,
        url: &str,
        params: &Value,
    ) -> std::result::Result<CachedResponse, Uncached> {
        let request = ApiRequest {
            url: url.to_string(),
            method,
            headers: self.headers.clone(),
            body: Some(params.clone()),
        };

        let response = self.transport.perform_request(request).await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            Uncached::Failed(e)
        })?;

        match serde_json::from_str::<Value>(&response.text) {
            Ok(body) => Ok(CachedResponse::new(response.status, body)),
            Err(e) => {
                warn!(
                    "Unparsable body from {} (status {}): {}",
                    url, response.status, e
                );
                Err(Uncached::Unparsed(response.status))
            }
        }
    }
}
