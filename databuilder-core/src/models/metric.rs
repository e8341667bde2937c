use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::DASHBOARD_NODE_LABEL;
use crate::models::dashboard::metadata::{
    DESCRIPTION_NODE_LABEL, DESCRIPTION_OF_RELATION_TYPE, DESCRIPTION_RELATION_TYPE,
};
use crate::models::{Model, TAG_NODE_LABEL, de};
use crate::types::Record;

pub const METRIC_NODE_LABEL: &str = "Metric";
pub const METRIC_TYPE_NODE_LABEL: &str = "Metrictype";

pub const METRIC_DASHBOARD_RELATION_TYPE: &str = "METRIC_OF";
pub const DASHBOARD_METRIC_RELATION_TYPE: &str = "METRIC";
pub const METRIC_METRIC_TYPE_RELATION_TYPE: &str = "METRIC_TYPE";
pub const METRIC_TYPE_METRIC_RELATION_TYPE: &str = "METRIC_TYPE_OF";
pub const METRIC_TAG_RELATION_TYPE: &str = "TAG";
pub const TAG_METRIC_RELATION_TYPE: &str = "TAG_OF";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricMetadataFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_name: String,
    #[serde(deserialize_with = "de::string")]
    pub name: String,
    #[serde(deserialize_with = "de::string")]
    pub expression: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "de::opt_string")]
    pub metric_type: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub tags: Vec<String>,
}

/// A metric shown on a dashboard, with its type, description and tags.
///
/// Metric types and tags are shared by many metrics, so their nodes are
/// claimed in [`SerializedKeys`]. The same metric is often extracted once per
/// dashboard query that uses it; each of its relationships is emitted only by
/// the first record of the run that claims it.
#[derive(Debug, Clone)]
pub struct MetricMetadata {
    pub fields: MetricMetadataFields,
    cursor: GraphCursor,
}

impl MetricMetadata {
    pub fn new(fields: MetricMetadataFields, keys: &SerializedKeys) -> Self {
        let mut metric = Self {
            fields,
            cursor: GraphCursor::default(),
        };
        let relations = metric
            .relations()
            .into_iter()
            .filter(|relation| keys.claim_relation(relation))
            .collect();
        metric.cursor = GraphCursor::new(metric.nodes(keys), relations);
        metric
    }

    pub fn from_record(record: &Record, keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields: MetricMetadataFields = de::from_record("metric_metadata", record)?;
        Ok(Model::MetricMetadata(Self::new(fields, keys)))
    }

    pub fn key(&self) -> String {
        format!("metric://{}", self.fields.name)
    }

    pub fn dashboard_key(&self) -> String {
        format!(
            "{}://{}",
            self.fields.dashboard_group, self.fields.dashboard_name
        )
    }

    fn description_key(&self) -> String {
        format!("{}/_description", self.key())
    }

    fn type_key(metric_type: &str) -> String {
        format!("type://{metric_type}")
    }

    fn nodes(&self, keys: &SerializedKeys) -> Vec<GraphNode> {
        let f = &self.fields;
        let mut nodes = vec![
            GraphNode::new(self.key(), METRIC_NODE_LABEL)
                .with_attribute("name", f.name.as_str())
                .with_attribute("expression", f.expression.as_str()),
        ];

        if let Some(description) = &f.description {
            nodes.push(
                GraphNode::new(self.description_key(), DESCRIPTION_NODE_LABEL)
                    .with_attribute("description", description.as_str()),
            );
        }

        for tag in &f.tags {
            if keys.claim(tag) {
                nodes.push(
                    GraphNode::new(tag, TAG_NODE_LABEL).with_attribute("tag_type", "metric"),
                );
            }
        }

        if let Some(metric_type) = &f.metric_type {
            let type_key = Self::type_key(metric_type);
            if keys.claim(&type_key) {
                nodes.push(
                    GraphNode::new(type_key, METRIC_TYPE_NODE_LABEL)
                        .with_attribute("name", metric_type.as_str()),
                );
            }
        }

        nodes
    }

    fn relations(&self) -> Vec<GraphRelationship> {
        let f = &self.fields;
        let key = self.key();
        let mut relations = vec![GraphRelationship::new(
            METRIC_NODE_LABEL,
            &key,
            DASHBOARD_NODE_LABEL,
            self.dashboard_key(),
            METRIC_DASHBOARD_RELATION_TYPE,
            DASHBOARD_METRIC_RELATION_TYPE,
        )];

        if f.description.is_some() {
            relations.push(GraphRelationship::new(
                METRIC_NODE_LABEL,
                &key,
                DESCRIPTION_NODE_LABEL,
                self.description_key(),
                DESCRIPTION_RELATION_TYPE,
                DESCRIPTION_OF_RELATION_TYPE,
            ));
        }

        for tag in &f.tags {
            relations.push(GraphRelationship::new(
                METRIC_NODE_LABEL,
                &key,
                TAG_NODE_LABEL,
                tag,
                METRIC_TAG_RELATION_TYPE,
                TAG_METRIC_RELATION_TYPE,
            ));
        }

        if let Some(metric_type) = &f.metric_type {
            relations.push(GraphRelationship::new(
                METRIC_NODE_LABEL,
                &key,
                METRIC_TYPE_NODE_LABEL,
                Self::type_key(metric_type),
                METRIC_METRIC_TYPE_RELATION_TYPE,
                METRIC_TYPE_METRIC_RELATION_TYPE,
            ));
        }

        relations
    }
}

impl GraphSerializable for MetricMetadata {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
