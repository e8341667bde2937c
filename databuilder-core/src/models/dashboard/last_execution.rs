use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::{DASHBOARD_NODE_LABEL, dashboard_key, default_cluster};
use crate::models::{Model, de};
use crate::types::Record;

pub const EXECUTION_NODE_LABEL: &str = "Execution";
pub const LAST_EXECUTED_RELATION_TYPE: &str = "LAST_EXECUTED";
pub const LAST_EXECUTION_OF_RELATION_TYPE: &str = "LAST_EXECUTION_OF";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardLastExecutionFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group_id: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_id: String,
    #[serde(deserialize_with = "de::int")]
    pub execution_timestamp: i64,
    #[serde(deserialize_with = "de::string")]
    pub execution_state: String,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// Epoch and state of a dashboard's most recent execution.
#[derive(Debug, Clone)]
pub struct DashboardLastExecution {
    pub fields: DashboardLastExecutionFields,
    cursor: GraphCursor,
}

impl DashboardLastExecution {
    pub fn new(fields: DashboardLastExecutionFields) -> Self {
        let dashboard = dashboard_key(
            &fields.product,
            &fields.cluster,
            &fields.dashboard_group_id,
            &fields.dashboard_id,
        );
        let key = format!("{dashboard}/_last_execution");

        let node = GraphNode::new(&key, EXECUTION_NODE_LABEL)
            .with_attribute("time_stamp", fields.execution_timestamp)
            .with_attribute("state", fields.execution_state.as_str());
        let relation = GraphRelationship::new(
            DASHBOARD_NODE_LABEL,
            dashboard,
            EXECUTION_NODE_LABEL,
            key,
            LAST_EXECUTED_RELATION_TYPE,
            LAST_EXECUTION_OF_RELATION_TYPE,
        );

        Self {
            fields,
            cursor: GraphCursor::new(vec![node], vec![relation]),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields = de::from_record("dashboard_last_execution", record)?;
        Ok(Model::DashboardLastExecution(Self::new(fields)))
    }
}

impl GraphSerializable for DashboardLastExecution {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_execution() {
        let record = json!({
            "dashboard_group_id": "ggg",
            "dashboard_id": "ddd",
            "execution_timestamp": "123456789",
            "execution_state": "succeeded",
            "product": "mode",
        });
        let Model::DashboardLastExecution(mut execution) =
            DashboardLastExecution::from_record(record.as_object().unwrap(), &SerializedKeys::new())
                .unwrap()
        else {
            panic!("expected an execution");
        };

        let node = execution.next_node().unwrap().unwrap();
        assert_eq!(node.key, "mode_dashboard://gold.ggg/ddd/_last_execution");
        assert_eq!(node.attributes["time_stamp"], json!(123456789));
        assert_eq!(node.attributes["state"], json!("succeeded"));

        let relation = execution.next_relation().unwrap().unwrap();
        assert_eq!(relation.start_key, "mode_dashboard://gold.ggg/ddd");
        assert_eq!(relation.relationship_type, "LAST_EXECUTED");
        assert_eq!(relation.reverse_type, "LAST_EXECUTION_OF");
        assert!(execution.next_relation().unwrap().is_none());
    }
}
