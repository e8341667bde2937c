use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::{DASHBOARD_NODE_LABEL, dashboard_key, default_cluster};
use crate::models::{Model, de};
use crate::types::Record;

pub const TIMESTAMP_NODE_LABEL: &str = "Timestamp";
pub const LAST_UPDATED_RELATION_TYPE: &str = "LAST_UPDATED_AT";
pub const LAST_UPDATED_REVERSE_RELATION_TYPE: &str = "LAST_UPDATED_TIME_OF";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardLastModifiedTimestampFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group_id: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_id: String,
    #[serde(deserialize_with = "de::int")]
    pub last_modified_timestamp: i64,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// Epoch of a dashboard's last modification.
#[derive(Debug, Clone)]
pub struct DashboardLastModifiedTimestamp {
    pub fields: DashboardLastModifiedTimestampFields,
    cursor: GraphCursor,
}

impl DashboardLastModifiedTimestamp {
    pub fn new(fields: DashboardLastModifiedTimestampFields) -> Self {
        let dashboard = dashboard_key(
            &fields.product,
            &fields.cluster,
            &fields.dashboard_group_id,
            &fields.dashboard_id,
        );
        let key = format!("{dashboard}/_last_modified_timestamp");

        let node = GraphNode::new(&key, TIMESTAMP_NODE_LABEL)
            .with_attribute("timestamp", fields.last_modified_timestamp)
            .with_attribute("name", "last_updated_timestamp");
        let relation = GraphRelationship::new(
            DASHBOARD_NODE_LABEL,
            dashboard,
            TIMESTAMP_NODE_LABEL,
            key,
            LAST_UPDATED_RELATION_TYPE,
            LAST_UPDATED_REVERSE_RELATION_TYPE,
        );

        Self {
            fields,
            cursor: GraphCursor::new(vec![node], vec![relation]),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields = de::from_record("dashboard_last_modified_timestamp", record)?;
        Ok(Model::DashboardLastModifiedTimestamp(Self::new(fields)))
    }
}

impl GraphSerializable for DashboardLastModifiedTimestamp {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
