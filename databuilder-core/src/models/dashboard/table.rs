use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::{DASHBOARD_NODE_LABEL, dashboard_key, default_cluster};
use crate::models::{Model, TABLE_NODE_LABEL, de, table_key};
use crate::types::Record;

pub const DASHBOARD_TABLE_RELATION_TYPE: &str = "DASHBOARD_WITH_TABLE";
pub const TABLE_DASHBOARD_RELATION_TYPE: &str = "TABLE_OF_DASHBOARD";

static TABLE_URI: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\w+)://(\w+)\.(\w+)/(\w+)").ok());

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardTableFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group_id: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_id: String,
    /// Table uris shaped like `db://cluster.schema/table`.
    #[serde(default, deserialize_with = "de::string_list")]
    pub table_ids: Vec<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// Links a dashboard to the tables its charts read. Creates no nodes.
#[derive(Debug, Clone)]
pub struct DashboardTable {
    pub fields: DashboardTableFields,
    cursor: GraphCursor,
}

impl DashboardTable {
    pub fn new(fields: DashboardTableFields) -> Self {
        let dashboard = dashboard_key(
            &fields.product,
            &fields.cluster,
            &fields.dashboard_group_id,
            &fields.dashboard_id,
        );

        let relations = fields
            .table_ids
            .iter()
            .filter_map(|uri| parse_table_uri(uri))
            .map(|table| {
                GraphRelationship::new(
                    DASHBOARD_NODE_LABEL,
                    &dashboard,
                    TABLE_NODE_LABEL,
                    table,
                    DASHBOARD_TABLE_RELATION_TYPE,
                    TABLE_DASHBOARD_RELATION_TYPE,
                )
            })
            .collect();

        Self {
            fields,
            cursor: GraphCursor::new(Vec::new(), relations),
        }
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields = de::from_record("dashboard_table", record)?;
        Ok(Model::DashboardTable(Self::new(fields)))
    }
}

/// Table key for a uri, `None` when the uri does not look like a table.
fn parse_table_uri(uri: &str) -> Option<String> {
    let captures = TABLE_URI.as_ref()?.captures(uri)?;
    Some(table_key(&captures[1], &captures[2], &captures[3], &captures[4]))
}

impl GraphSerializable for DashboardTable {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
