//! Typed wrapper around a search response

use super::types::ResultItem;
use serde::Serialize;
use serde_json::{Map, Value};

/// Result items plus the rest of the response (`meta`, `facets`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultList {
    /// Wrapped result items
    pub results: Vec<ResultItem>,
    /// Every response key except `results`
    pub info: Map<String, Value>,
}

impl ResultList {
    /// Split a response body into items and info
    ///
    /// A body without a `results` list yields no items.
    pub fn from_json(body: Value) -> Self {
        let mut info = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let results = match info.remove("results") {
            Some(Value::Array(items)) => items.into_iter().map(ResultItem::from).collect(),
            _ => Vec::new(),
        };

        Self { results, info }
    }

    /// Facet section of the response
    pub fn facets(&self) -> Option<&Map<String, Value>> {
        self.info.get("facets").and_then(|f| f.as_object())
    }

    /// Facet entry of a single field
    pub fn facet(&self, field: &str) -> Option<&Value> {
        self.facets().and_then(|f| f.get(field))
    }

    pub fn meta(&self) -> Option<&Value> {
        self.info.get("meta")
    }

    /// Request id, used when reporting clicks
    pub fn request_id(&self) -> Option<&str> {
        self.meta()
            .and_then(|m| m.get("request_id"))
            .and_then(|r| r.as_str())
    }

    /// Total matching documents as reported by the paging metadata
    pub fn total_results(&self) -> Option<u64> {
        self.meta()
            .and_then(|m| m.pointer("/page/total_results"))
            .and_then(|t| t.as_u64())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
