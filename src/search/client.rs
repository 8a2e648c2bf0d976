//! App Search client: search, multi-search and click tracking

use super::models::{ClickEvent, DisjunctiveSpec, SearchOptions, SearchRequest};
use crate::cache::{CachedResponse, QueryCache};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::network::{client_headers, Executor, HttpClient, HttpMethod, Transport};
use crate::results::ResultList;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Client for one App Search engine
#[derive(Clone)]
pub struct Client {
    executor: Executor,
    cache_responses: bool,
    search_path: String,
    multi_search_path: String,
    click_path: String,
}

impl Client {
    /// Create a client that talks HTTP through reqwest
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = HttpClient::with_settings(&settings.outgoing)?;
        Self::with_transport(settings, Arc::new(http))
    }

    /// Create a client on top of any transport
    pub fn with_transport(settings: &Settings, transport: Arc<dyn Transport>) -> Result<Self> {
        settings.validate()?;

        let api_endpoint = settings.client.api_endpoint()?;
        url::Url::parse(&api_endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", api_endpoint, e)))?;

        let headers = client_headers(
            settings.client.search_key.as_deref(),
            &settings.client.additional_headers,
        );
        let cache = QueryCache::with_settings(&settings.cache);
        let engine = urlencoding::encode(&settings.client.engine_name).into_owned();

        info!(
            "App Search client for engine '{}' at {}",
            settings.client.engine_name, api_endpoint
        );

        Ok(Self {
            executor: Executor::new(transport, cache, api_endpoint, headers),
            cache_responses: settings.client.cache_responses,
            search_path: format!("engines/{}/search.json", engine),
            multi_search_path: format!("engines/{}/multi_search.json", engine),
            click_path: format!("engines/{}/click.json", engine),
        })
    }

    /// The response cache owned by this client
    pub fn cache(&self) -> &QueryCache {
        self.executor.cache()
    }

    /// Run a search
    ///
    /// When `options.disjunctive_facets` names fields that are currently
    /// filtered, the facet counts of those fields are computed as if their
    /// own filter were absent.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<ResultList> {
        let body = match DisjunctiveSpec::from_options(options) {
            Some(spec) => {
                self.perform_disjunctive_search(query, options, &spec)
                    .await?
            }
            None => self.perform_search(query, options).await?,
        };

        Ok(ResultList::from_json(body))
    }

    /// Run several searches in one request; results keep the input order
    pub async fn multi_search(&self, searches: &[SearchRequest]) -> Result<Vec<ResultList>> {
        if let Some(position) = searches.iter().position(|s| s.options.is_disjunctive()) {
            return Err(Error::InvalidOptions(format!(
                "disjunctive facets are not supported in multi-search (query {})",
                position
            )));
        }

        let queries = searches
            .iter()
            .map(|s| s.options.to_params(&s.query))
            .collect::<Result<Vec<_>>>()?;
        let params = json!({ "queries": queries });

        debug!("Multi-search with {} queries", searches.len());
        let response = self
            .executor
            .request(HttpMethod::Post, &self.multi_search_path, &params, self.cache_responses)
            .await?;
        let body = check_status(response)?;

        match body {
            Value::Array(bodies) if bodies.len() == searches.len() => {
                Ok(bodies.into_iter().map(ResultList::from_json).collect())
            }
            Value::Array(bodies) => Err(Error::UnexpectedResponse(format!(
                "expected {} multi-search responses, got {}",
                searches.len(),
                bodies.len()
            ))),
            _ => Err(Error::UnexpectedResponse(
                "multi-search response is not a list".to_string(),
            )),
        }
    }

    /// Report a click-through
    ///
    /// Clicks are never served from the response cache, so repeated
    /// identical events are all recorded.
    pub async fn click(&self, event: &ClickEvent) -> Result<()> {
        let params = serde_json::to_value(event)?;
        let response = self
            .executor
            .request(HttpMethod::Post, &self.click_path, &params, false)
            .await?;
        check_status(response)?;
        Ok(())
    }

    /// Issue one search request and return its body
    pub(super) async fn perform_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Value> {
        let params = options.to_params(query)?;
        let response = self
            .executor
            .request(HttpMethod::Post, &self.search_path, &params, self.cache_responses)
            .await?;
        check_status(response)
    }
}

/// Turn a non-success status into [`Error::Http`]
fn check_status(response: CachedResponse) -> Result<Value> {
    if response.is_success() {
        return Ok(response.body);
    }

    Err(Error::Http {
        status: response.status,
        message: error_text(&response.body),
    })
}

/// Server-reported error text; multi-search bodies are lists of
/// sub-responses whose errors are concatenated
fn error_text(body: &Value) -> Option<String> {
    let errors: Vec<String> = match body {
        Value::Array(responses) => responses.iter().flat_map(errors_of).collect(),
        other => errors_of(other),
    };

    if errors.is_empty() {
        None
    } else {
        Some(errors.join(", "))
    }
}

fn errors_of(body: &Value) -> Vec<String> {
    match body.get("errors") {
        Some(Value::Array(list)) => list
            .iter()
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}
