//! Search request and related data models

use crate::error::Result;
use crate::filters::Filters;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Analytics tag attached to the auxiliary queries of a disjunctive search
pub const DEFAULT_DISJUNCTIVE_TAG: &str = "Facet-Only";

/// Facet configuration per field
///
/// The API accepts either one configuration object or a list of them per
/// field. Both forms are normalized to a list when the spec is built and
/// each field serializes back in the form it was given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSpec {
    fields: BTreeMap<String, Vec<Value>>,
    /// Fields given as a list, kept as a list even with one entry
    listed: BTreeSet<String>,
}

impl FacetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one configuration for `field`
    pub fn insert(&mut self, field: impl Into<String>, config: Value) {
        self.fields.entry(field.into()).or_default().push(config);
    }

    pub fn get(&self, field: &str) -> Option<&[Value]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Spec narrowed to `field` alone; empty when `field` has no facet
    pub fn only(&self, field: &str) -> FacetSpec {
        let fields = self
            .fields
            .get_key_value(field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .into_iter()
            .collect();
        let listed = self.listed.get(field).cloned().into_iter().collect();
        FacetSpec { fields, listed }
    }

    /// Normalize a JSON `facets` object
    pub fn from_json(value: &Value) -> std::result::Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "facets must be an object".to_string())?;

        let mut spec = FacetSpec::new();
        for (field, config) in object {
            let configs = match config {
                Value::Array(list) => {
                    spec.listed.insert(field.clone());
                    list.clone()
                }
                Value::Object(_) => vec![config.clone()],
                _ => {
                    return Err(format!(
                        "facet configuration for '{}' must be an object or a list",
                        field
                    ))
                }
            };
            spec.fields.insert(field.clone(), configs);
        }
        Ok(spec)
    }
}

impl Serialize for FacetSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, configs) in &self.fields {
            match configs.as_slice() {
                [single] if !self.listed.contains(field) => map.serialize_entry(field, single)?,
                many => map.serialize_entry(field, many)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FacetSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FacetSpec::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Paging options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
}

/// Analytics options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Options accepted by a search
///
/// Anything the client does not model explicitly (sort, group, boosts,
/// precision, ...) goes into `extra` and is sent unchanged. The two
/// disjunctive options drive the client and are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(default, skip_serializing_if = "FacetSpec::is_empty")]
    pub facets: FacetSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
    /// Fields whose facet counts ignore their own filter
    #[serde(default, skip_serializing, alias = "disjunctiveFacets")]
    pub disjunctive_facets: Vec<String>,
    /// Tags for the auxiliary disjunctive queries
    #[serde(
        default,
        skip_serializing,
        alias = "disjunctiveFacetsAnalyticsTags"
    )]
    pub disjunctive_facets_analytics_tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Add a facet configuration for `field`
    pub fn with_facet(mut self, field: impl Into<String>, config: Value) -> Self {
        self.facets.insert(field, config);
        self
    }

    pub fn with_page(mut self, size: u32, current: u32) -> Self {
        self.page = Some(Page {
            size: Some(size),
            current: Some(current.max(1)),
        });
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analytics = Some(Analytics {
            tags: tags.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_disjunctive_facets<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disjunctive_facets = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_disjunctive_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disjunctive_facets_analytics_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Pass any other API option through unchanged
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// True when the caller asked for disjunctive facets
    pub fn is_disjunctive(&self) -> bool {
        !self.disjunctive_facets.is_empty()
    }

    /// Wire parameters for `query` with these options
    pub fn to_params(&self, query: &str) -> Result<Value> {
        #[derive(Serialize)]
        struct SearchParams<'a> {
            query: &'a str,
            #[serde(flatten)]
            options: &'a SearchOptions,
        }

        Ok(serde_json::to_value(SearchParams {
            query,
            options: self,
        })?)
    }
}

/// Which facets are disjunctive and how their auxiliary queries are tagged
#[derive(Debug, Clone, PartialEq)]
pub struct DisjunctiveSpec {
    pub fields: BTreeSet<String>,
    pub analytics_tags: Vec<String>,
}

impl DisjunctiveSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            analytics_tags: vec![DEFAULT_DISJUNCTIVE_TAG.to_string()],
        }
    }

    /// Extract the spec from search options; `None` for a plain search
    pub fn from_options(options: &SearchOptions) -> Option<Self> {
        if !options.is_disjunctive() {
            return None;
        }
        let mut spec = Self::new(options.disjunctive_facets.iter().cloned());
        if let Some(tags) = &options.disjunctive_facets_analytics_tags {
            spec.analytics_tags = tags.clone();
        }
        Some(spec)
    }

    /// Disjunctive fields that currently carry a filter
    pub fn active_fields(&self, filters: Option<&Filters>) -> BTreeSet<String> {
        match filters {
            Some(filters) => filters
                .applied_fields()
                .intersection(&self.fields)
                .cloned()
                .collect(),
            None => BTreeSet::new(),
        }
    }
}

/// One entry of a multi-search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }
}

/// Click-through event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub query: String,
    pub document_id: String,
    pub request_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ClickEvent {
    pub fn new(
        query: impl Into<String>,
        document_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            document_id: document_id.into(),
            request_id: request_id.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}
