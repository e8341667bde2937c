use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::{COLUMN_NODE_LABEL, Model, de, table_key};
use crate::types::Record;

pub const STAT_NODE_LABEL: &str = "Stat";
pub const STAT_COLUMN_RELATION_TYPE: &str = "STAT_OF";
pub const COLUMN_STAT_RELATION_TYPE: &str = "STAT";

fn default_db() -> String {
    "hive".to_string()
}

fn default_cluster() -> String {
    "gold".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableColumnStatsFields {
    /// `table` when `schema` is given, otherwise `schema.table`.
    #[serde(deserialize_with = "de::string")]
    pub table_name: String,
    #[serde(deserialize_with = "de::string")]
    pub col_name: String,
    #[serde(deserialize_with = "de::string")]
    pub stat_name: String,
    #[serde(deserialize_with = "de::string")]
    pub stat_val: String,
    #[serde(deserialize_with = "de::string")]
    pub start_epoch: String,
    #[serde(deserialize_with = "de::string")]
    pub end_epoch: String,
    #[serde(default = "default_db", deserialize_with = "de::string")]
    pub db: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub schema: Option<String>,
}

/// One computed statistic of a table column.
#[derive(Debug, Clone)]
pub struct TableColumnStats {
    pub db: String,
    pub cluster: String,
    pub schema: String,
    pub table: String,
    pub col_name: String,
    pub stat_name: String,
    pub stat_val: String,
    pub start_epoch: String,
    pub end_epoch: String,
    cursor: GraphCursor,
}

impl TableColumnStats {
    pub fn new(fields: TableColumnStatsFields) -> Result<Self, ModelError> {
        let (schema, table) = match fields.schema {
            Some(schema) => (schema, fields.table_name),
            None => match fields.table_name.split_once('.') {
                Some((schema, table)) if !table.contains('.') => {
                    (schema.to_string(), table.to_string())
                }
                _ => {
                    return Err(ModelError::InvalidValue {
                        model: "table_column_stats".into(),
                        field: "table_name".into(),
                        message: format!(
                            "expected 'schema.table' when no schema is given, got {:?}",
                            fields.table_name
                        ),
                    });
                }
            },
        };

        let mut stats = Self {
            db: fields.db,
            cluster: fields.cluster,
            schema: schema.to_lowercase(),
            table: table.to_lowercase(),
            col_name: fields.col_name.to_lowercase(),
            stat_name: fields.stat_name,
            stat_val: fields.stat_val,
            start_epoch: fields.start_epoch,
            end_epoch: fields.end_epoch,
            cursor: GraphCursor::default(),
        };
        stats.cursor = GraphCursor::new(vec![stats.node()], vec![stats.relation()]);
        Ok(stats)
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields: TableColumnStatsFields = de::from_record("table_column_stats", record)?;
        Ok(Model::TableColumnStats(Self::new(fields)?))
    }

    pub fn key(&self) -> String {
        format!("{}/{}/{}/", self.table_key(), self.col_name, self.stat_name)
    }

    pub fn column_key(&self) -> String {
        format!("{}/{}", self.table_key(), self.col_name)
    }

    fn table_key(&self) -> String {
        table_key(&self.db, &self.cluster, &self.schema, &self.table)
    }

    fn node(&self) -> GraphNode {
        GraphNode::new(self.key(), STAT_NODE_LABEL)
            .with_unquoted_attribute("stat_val", self.stat_val.as_str())
            .with_attribute("stat_name", self.stat_name.as_str())
            .with_attribute("start_epoch", self.start_epoch.as_str())
            .with_attribute("end_epoch", self.end_epoch.as_str())
    }

    fn relation(&self) -> GraphRelationship {
        GraphRelationship::new(
            STAT_NODE_LABEL,
            self.key(),
            COLUMN_NODE_LABEL,
            self.column_key(),
            STAT_COLUMN_RELATION_TYPE,
            COLUMN_STAT_RELATION_TYPE,
        )
    }
}

impl GraphSerializable for TableColumnStats {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
