use serde::{Deserialize, Serialize};

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::{Model, de};
use crate::types::Record;

pub const BADGE_NODE_LABEL: &str = "Badge";
pub const BADGE_RELATION_TYPE: &str = "HAS_BADGE";
pub const INVERSE_BADGE_RELATION_TYPE: &str = "BADGE_FOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    pub category: String,
}

impl Badge {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BadgeFields {
    #[serde(deserialize_with = "de::string")]
    pub start_label: String,
    #[serde(deserialize_with = "de::string")]
    pub start_key: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

/// Badges attached to any node (usually a table or a column).
#[derive(Debug, Clone)]
pub struct BadgeMetadata {
    pub start_label: String,
    pub start_key: String,
    pub badges: Vec<Badge>,
    cursor: GraphCursor,
}

impl BadgeMetadata {
    pub fn new(
        start_label: impl Into<String>,
        start_key: impl Into<String>,
        badges: Vec<Badge>,
    ) -> Self {
        let start_label = start_label.into();
        let start_key = start_key.into();

        let nodes = badges
            .iter()
            .map(|badge| {
                GraphNode::new(&badge.name, BADGE_NODE_LABEL)
                    .with_attribute("category", badge.category.as_str())
            })
            .collect();
        let relations = badges
            .iter()
            .map(|badge| {
                GraphRelationship::new(
                    &start_label,
                    &start_key,
                    BADGE_NODE_LABEL,
                    &badge.name,
                    BADGE_RELATION_TYPE,
                    INVERSE_BADGE_RELATION_TYPE,
                )
            })
            .collect();

        Self {
            start_label,
            start_key,
            badges,
            cursor: GraphCursor::new(nodes, relations),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields: BadgeFields = de::from_record("badge", record)?;
        Ok(Model::Badge(Self::new(fields.start_label, fields.start_key, fields.badges)))
    }
}

impl GraphSerializable for BadgeMetadata {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
