//! Filter tree parsing, pruning and flattening

use crate::error::{Error, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Boolean combinator keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    All,
    Any,
    None,
}

impl Combinator {
    /// Parse a JSON key, returning `None` for plain field names
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "all" => Some(Combinator::All),
            "any" => Some(Combinator::Any),
            "none" => Some(Combinator::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::All => "all",
            Combinator::Any => "any",
            Combinator::None => "none",
        }
    }
}

/// One key of a filter object
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEntry {
    /// `field: value` where value is a scalar, list or range object
    Leaf { field: String, value: Value },
    /// `all|any|none: [filters, ...]`
    Combinator {
        kind: Combinator,
        children: Vec<Filters>,
    },
}

impl FilterEntry {
    fn key(&self) -> &str {
        match self {
            FilterEntry::Leaf { field, .. } => field,
            FilterEntry::Combinator { kind, .. } => kind.as_str(),
        }
    }
}

/// A filter object: an ordered set of entries, one per JSON key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<FilterEntry>,
}

impl Filters {
    /// Create an empty filter object
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter object with a single leaf condition
    pub fn leaf(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            entries: vec![FilterEntry::Leaf {
                field: field.into(),
                value: value.into(),
            }],
        }
    }

    /// Filter object with a single combinator
    pub fn combinator(kind: Combinator, children: Vec<Filters>) -> Self {
        Self {
            entries: vec![FilterEntry::Combinator { kind, children }],
        }
    }

    /// Add an entry, replacing any entry with the same key
    pub fn with_entry(mut self, entry: FilterEntry) -> Self {
        self.entries.retain(|e| e.key() != entry.key());
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// True when the object has no keys at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON filter object
    ///
    /// Combinator values must be lists of non-empty objects; anything else
    /// is rejected as [`Error::MalformedFilter`].
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::parse(value, "filters")
    }

    fn parse(value: &Value, path: &str) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| Error::MalformedFilter {
            path: path.to_string(),
            reason: format!("expected an object, found {}", json_kind(value)),
        })?;

        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            let entry = match Combinator::from_key(key) {
                Some(kind) => {
                    let child_path = format!("{}.{}", path, key);
                    let list = value.as_array().ok_or_else(|| Error::MalformedFilter {
                        path: child_path.clone(),
                        reason: format!("expected a list, found {}", json_kind(value)),
                    })?;
                    let children = list
                        .iter()
                        .enumerate()
                        .map(|(i, child)| Self::parse_child(child, &format!("{}[{}]", child_path, i)))
                        .collect::<Result<Vec<_>>>()?;
                    FilterEntry::Combinator { kind, children }
                }
                None => FilterEntry::Leaf {
                    field: key.clone(),
                    value: value.clone(),
                },
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Combinator list elements must carry at least one key
    fn parse_child(value: &Value, path: &str) -> Result<Self> {
        let child = Self::parse(value, path)?;
        if child.is_empty() {
            return Err(Error::MalformedFilter {
                path: path.to_string(),
                reason: "expected at least one condition, found an empty object".to_string(),
            });
        }
        Ok(child)
    }

    /// Render back to the wire JSON shape
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for entry in &self.entries {
            match entry {
                FilterEntry::Leaf { field, value } => {
                    object.insert(field.clone(), value.clone());
                }
                FilterEntry::Combinator { kind, children } => {
                    let list = children.iter().map(Filters::to_json).collect();
                    object.insert(kind.as_str().to_string(), Value::Array(list));
                }
            }
        }
        Value::Object(object)
    }

    /// Every field name with a condition anywhere in the tree
    pub fn applied_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut BTreeSet<String>) {
        for entry in &self.entries {
            match entry {
                FilterEntry::Leaf { field, .. } => {
                    fields.insert(field.clone());
                }
                FilterEntry::Combinator { children, .. } => {
                    for child in children {
                        child.collect_fields(fields);
                    }
                }
            }
        }
    }

    /// Copy of this tree without any condition on `field`
    ///
    /// Children that lose all their keys are dropped from their combinator
    /// list. A combinator emptied this way stays as `[]` while its object
    /// still has other keys, and the whole object collapses when nothing
    /// else is left in it.
    pub fn remove_filter(&self, field: &str) -> Filters {
        self.prune(field).unwrap_or_default()
    }

    /// `None` signals that the object has no keys left
    fn prune(&self, field: &str) -> Option<Filters> {
        if !self.mentions(field) {
            return Some(self.clone());
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        let mut live = false;

        for entry in &self.entries {
            match entry {
                FilterEntry::Leaf { field: name, .. } if name == field => {}
                FilterEntry::Leaf { .. } => {
                    live = true;
                    entries.push(entry.clone());
                }
                FilterEntry::Combinator { kind, children } => {
                    let children: Vec<Filters> =
                        children.iter().filter_map(|c| c.prune(field)).collect();
                    live |= !children.is_empty();
                    // Emptied combinators keep their key next to surviving siblings
                    entries.push(FilterEntry::Combinator {
                        kind: *kind,
                        children,
                    });
                }
            }
        }

        live.then_some(Filters { entries })
    }

    /// True when `field` has a condition somewhere below this object
    fn mentions(&self, field: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            FilterEntry::Leaf { field: name, .. } => name == field,
            FilterEntry::Combinator { children, .. } => {
                children.iter().any(|c| c.mentions(field))
            }
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

impl Serialize for Filters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry {
                FilterEntry::Leaf { field, value } => map.serialize_entry(field, value)?,
                FilterEntry::Combinator { kind, children } => {
                    map.serialize_entry(kind.as_str(), children)?
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Filters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filters::from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for Filters {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Filters::from_json(&value)
    }
}
