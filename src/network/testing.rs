//! In-memory transport for tests

use super::traits::{ApiRequest, Transport, TransportResponse};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

type Responder = Box<dyn Fn(&ApiRequest) -> Result<TransportResponse> + Send + Sync>;

/// Records every request and answers through a responder closure
pub struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<TransportResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            delay: None,
            barrier: None,
        }
    }

    /// Always answer 200 with `body`
    pub fn ok(body: Value) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        let text = body.to_string();
        Self::new(move |_| Ok(TransportResponse::new(status, text.clone())))
    }

    /// Always answer with a raw, possibly non-JSON body
    pub fn raw(status: u16, text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(TransportResponse::new(status, text.clone())))
    }

    /// Sleep before answering each request
    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    /// Hold every request until `parties` requests are in flight at once
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON bodies of every request, in arrival order
    pub fn bodies(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.body)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform_request(&self, request: ApiRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(&request)
    }
}
