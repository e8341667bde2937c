use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::last_execution::EXECUTION_NODE_LABEL;
use crate::models::dashboard::{DASHBOARD_NODE_LABEL, dashboard_key, default_cluster};
use crate::models::{Model, de};
use crate::types::Record;

pub const EXECUTED_RELATION_TYPE: &str = "EXECUTED";
pub const EXECUTION_OF_RELATION_TYPE: &str = "EXECUTION_OF";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardExecutionFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group_id: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_id: String,
    #[serde(deserialize_with = "de::string")]
    pub execution_id: String,
    #[serde(deserialize_with = "de::int")]
    pub execution_timestamp: i64,
    #[serde(deserialize_with = "de::string")]
    pub execution_state: String,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// One identified run of a dashboard. Unlike [`super::DashboardLastExecution`],
/// every execution keeps its own node.
#[derive(Debug, Clone)]
pub struct DashboardExecution {
    pub fields: DashboardExecutionFields,
    cursor: GraphCursor,
}

impl DashboardExecution {
    pub fn new(fields: DashboardExecutionFields) -> Self {
        let dashboard = dashboard_key(
            &fields.product,
            &fields.cluster,
            &fields.dashboard_group_id,
            &fields.dashboard_id,
        );
        let key = format!("{dashboard}/execution/{}", fields.execution_id);

        let node = GraphNode::new(&key, EXECUTION_NODE_LABEL)
            .with_attribute("timestamp", fields.execution_timestamp)
            .with_attribute("state", fields.execution_state.as_str());
        let relation = GraphRelationship::new(
            DASHBOARD_NODE_LABEL,
            dashboard,
            EXECUTION_NODE_LABEL,
            key,
            EXECUTED_RELATION_TYPE,
            EXECUTION_OF_RELATION_TYPE,
        );

        Self {
            fields,
            cursor: GraphCursor::new(vec![node], vec![relation]),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields = de::from_record("dashboard_execution", record)?;
        Ok(Model::DashboardExecution(Self::new(fields)))
    }
}

impl GraphSerializable for DashboardExecution {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
