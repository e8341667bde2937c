use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A bidirectional edge between two graph nodes.
///
/// Every relationship is published as two directed edges: `relationship_type`
/// from start to end and `reverse_type` from end to start (e.g. `OWNER` /
/// `OWNER_OF`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub start_label: String,
    pub start_key: String,
    pub end_label: String,
    pub end_key: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    pub reverse_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl GraphRelationship {
    pub fn new(
        start_label: impl Into<String>,
        start_key: impl Into<String>,
        end_label: impl Into<String>,
        end_key: impl Into<String>,
        relationship_type: impl Into<String>,
        reverse_type: impl Into<String>,
    ) -> Self {
        Self {
            start_label: start_label.into(),
            start_key: start_key.into(),
            end_label: end_label.into(),
            end_key: end_key.into(),
            relationship_type: relationship_type.into(),
            reverse_type: reverse_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}
