use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::{DASHBOARD_NODE_LABEL, dashboard_key, default_cluster};
use crate::models::{Model, de};
use crate::types::Record;

pub const QUERY_NODE_LABEL: &str = "Query";
pub const HAS_QUERY_RELATION_TYPE: &str = "HAS_QUERY";
pub const QUERY_OF_RELATION_TYPE: &str = "QUERY_OF";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardQueryFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group_id: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_id: String,
    #[serde(deserialize_with = "de::string")]
    pub query_name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub query_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub query_text: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// A query backing one of a dashboard's charts.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub fields: DashboardQueryFields,
    cursor: GraphCursor,
}

impl DashboardQuery {
    pub fn new(fields: DashboardQueryFields) -> Self {
        let query_id = fields
            .query_id
            .clone()
            .unwrap_or_else(|| fields.query_name.clone());
        let dashboard = dashboard_key(
            &fields.product,
            &fields.cluster,
            &fields.dashboard_group_id,
            &fields.dashboard_id,
        );
        let key = format!("{dashboard}/query/{query_id}");

        let node = GraphNode::new(&key, QUERY_NODE_LABEL)
            .with_attribute("id", query_id)
            .with_attribute("name", fields.query_name.as_str())
            .with_optional_attribute("url", fields.url.clone())
            .with_optional_attribute("query_text", fields.query_text.clone());
        let relation = GraphRelationship::new(
            DASHBOARD_NODE_LABEL,
            dashboard,
            QUERY_NODE_LABEL,
            key,
            HAS_QUERY_RELATION_TYPE,
            QUERY_OF_RELATION_TYPE,
        );

        Self {
            fields,
            cursor: GraphCursor::new(vec![node], vec![relation]),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields = de::from_record("dashboard_query", record)?;
        Ok(Model::DashboardQuery(Self::new(fields)))
    }
}

impl GraphSerializable for DashboardQuery {
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
    fn test_query_node() {
        let record = json!({
            "dashboard_group_id": "dg_id",
            "dashboard_id": "d_id",
            "query_id": 42,
            "query_name": "q_name",
            "url": "http://foo.bar/query/baz",
            "query_text": "SELECT * FROM foo.bar",
            "product": "mode",
        });
        let Model::DashboardQuery(mut query) =
            DashboardQuery::from_record(record.as_object().unwrap(), &SerializedKeys::new())
                .unwrap()
        else {
            panic!("expected a query");
        };

        let node = query.next_node().unwrap().unwrap();
        assert_eq!(node.key, "mode_dashboard://gold.dg_id/d_id/query/42");
        assert_eq!(node.attributes["id"], json!("42"));
        assert_eq!(node.attributes["query_text"], json!("SELECT * FROM foo.bar"));

        let relation = query.next_relation().unwrap().unwrap();
        assert_eq!(relation.start_key, "mode_dashboard://gold.dg_id/d_id");
        assert_eq!(relation.relationship_type, "HAS_QUERY");
        assert_eq!(relation.reverse_type, "QUERY_OF");
    }

    #[test]
    fn test_query_id_defaults_to_name() {
        let query = DashboardQuery::new(DashboardQueryFields {
            dashboard_group_id: "g".into(),
            dashboard_id: "d".into(),
            query_name: "daily".into(),
            query_id: None,
            url: None,
            query_text: None,
            product: String::new(),
            cluster: default_cluster(),
        });
        let mut query = query;
        let node = query.next_node().unwrap().unwrap();
        assert_eq!(node.key, "_dashboard://gold.g/d/query/daily");
        assert!(!node.attributes.contains_key("url"));
    }
}
