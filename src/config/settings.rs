//! Settings structures for AppSearch-RS configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure, loadable from a YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientSettings,
    pub outgoing: OutgoingSettings,
    pub cache: CacheSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Merge with environment variables (APPSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("APPSEARCH_HOST_IDENTIFIER") {
            self.client.host_identifier = Some(val);
        }
        if let Ok(val) = std::env::var("APPSEARCH_SEARCH_KEY") {
            self.client.search_key = Some(val);
        }
        if let Ok(val) = std::env::var("APPSEARCH_ENGINE_NAME") {
            self.client.engine_name = val;
        }
        if let Ok(val) = std::env::var("APPSEARCH_ENDPOINT_BASE") {
            self.client.endpoint_base = Some(val);
        }
        if let Ok(val) = std::env::var("APPSEARCH_CACHE_RESPONSES") {
            self.client.cache_responses = val.parse().unwrap_or(false);
        }
    }

    /// Check that a client can be built from these settings
    pub fn validate(&self) -> Result<()> {
        if self.client.engine_name.trim().is_empty() {
            return Err(Error::Config("engine_name is required".to_string()));
        }
        if self.client.host_identifier.is_none() && self.client.endpoint_base.is_none() {
            return Err(Error::Config(
                "either host_identifier or endpoint_base is required".to_string(),
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(Error::Config("cache.max_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

/// Connection and identity settings for the App Search engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Host identifier, e.g. `host-2376rb`
    pub host_identifier: Option<String>,
    /// Public search key, sent as a bearer token
    pub search_key: Option<String>,
    /// Engine to query
    pub engine_name: String,
    /// Full base URL for self-managed deployments; overrides the host identifier
    pub endpoint_base: Option<String>,
    /// Reuse responses for identical requests
    pub cache_responses: bool,
    /// Extra headers to send with every request
    pub additional_headers: HashMap<String, String>,
}

impl ClientSettings {
    /// Base URL of the v1 API, always ending in `/`
    pub fn api_endpoint(&self) -> Result<String> {
        match (&self.endpoint_base, &self.host_identifier) {
            (Some(base), _) if !base.is_empty() => {
                Ok(format!("{}/api/as/v1/", base.trim_end_matches('/')))
            }
            (_, Some(host)) if !host.is_empty() => {
                Ok(format!("https://{}.api.swiftype.com/api/as/v1/", host))
            }
            _ => Err(Error::Config(
                "either host_identifier or endpoint_base is required".to_string(),
            )),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Response cache bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of cached responses
    pub max_capacity: u64,
    /// Expire entries after this many seconds; none keeps them until evicted
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_seconds: None,
        }
    }
}
