//! HTTP client for making requests to the App Search API

use super::traits::{ApiRequest, HttpMethod, Transport, TransportResponse};
use crate::config::OutgoingSettings;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
        })
    }

    /// Execute a request with the default timeout
    pub async fn execute(&self, request: ApiRequest) -> Result<TransportResponse> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute a request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: ApiRequest,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.timeout(timeout);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body.to_string());
        }

        debug!("{} {}", request.method.as_str(), request.url);
        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Read status and body text
    async fn parse_response(response: Response) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(TransportResponse { status, text })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn perform_request(&self, request: ApiRequest) -> Result<TransportResponse> {
        self.execute(request).await
    }
}
