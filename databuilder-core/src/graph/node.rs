use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute key suffix telling a sink to write the value without quotes.
pub const UNQUOTED_SUFFIX: &str = ":UNQUOTED";

/// A vertex in the metadata graph.
///
/// `key` is a globally unique identifier, conventionally shaped like
/// `{source}://{cluster}.{schema}/{name}[/{suffix}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl GraphNode {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute, consuming and returning the node.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add an attribute that sinks must write verbatim (numbers, booleans).
    pub fn with_unquoted_attribute(self, name: &str, value: impl Into<Value>) -> Self {
        self.with_attribute(format!("{name}{UNQUOTED_SUFFIX}"), value)
    }

    /// Add an attribute only when a value is present.
    pub fn with_optional_attribute<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_attribute(name, v),
            None => self,
        }
    }
}
