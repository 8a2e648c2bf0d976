//! Result item wrapper

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single search result as returned by the API
///
/// Each field maps to an object with a `raw` value and, for text fields
/// requested with snippets, a highlighted `snippet`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultItem {
    data: Map<String, Value>,
}

impl ResultItem {
    /// Raw value of `field`
    pub fn get_raw(&self, field: &str) -> Option<&Value> {
        self.data.get(field).and_then(|f| f.get("raw"))
    }

    /// Highlighted snippet of `field`
    pub fn get_snippet(&self, field: &str) -> Option<&str> {
        self.data
            .get(field)
            .and_then(|f| f.get("snippet"))
            .and_then(|s| s.as_str())
    }

    /// Document id, read from the `id` field
    pub fn id(&self) -> Option<&str> {
        self.get_raw("id").and_then(|v| v.as_str())
    }

    /// The full field map
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl From<Value> for ResultItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(data) => Self { data },
            _ => Self::default(),
        }
    }
}
