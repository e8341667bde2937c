use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::{Model, TABLE_NODE_LABEL, de, table_key};
use crate::types::Record;

pub const WATERMARK_NODE_LABEL: &str = "Watermark";
pub const WATERMARK_TABLE_RELATION_TYPE: &str = "BELONG_TO_TABLE";
pub const TABLE_WATERMARK_RELATION_TYPE: &str = "WATERMARK";

fn default_part_type() -> String {
    "high_watermark".to_string()
}

fn default_cluster() -> String {
    "gold".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkFields {
    #[serde(deserialize_with = "de::string")]
    pub create_time: String,
    #[serde(deserialize_with = "de::string")]
    pub database: String,
    #[serde(deserialize_with = "de::string")]
    pub schema: String,
    #[serde(deserialize_with = "de::string")]
    pub table_name: String,
    #[serde(deserialize_with = "de::string")]
    pub part_name: String,
    #[serde(default = "default_part_type", deserialize_with = "de::string")]
    pub part_type: String,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
}

/// High or low partition watermark of a partitioned table.
#[derive(Debug, Clone)]
pub struct Watermark {
    pub create_time: String,
    pub database: String,
    pub schema: String,
    pub table: String,
    pub partition_key: String,
    pub partition_value: String,
    pub part_type: String,
    pub cluster: String,
    cursor: GraphCursor,
}

impl Watermark {
    /// Fails when `part_name` is not of the form `key=value`.
    pub fn new(fields: WatermarkFields) -> Result<Self, ModelError> {
        let part_name = fields.part_name.to_lowercase();
        let Some((partition_key, partition_value)) = part_name.split_once('=') else {
            return Err(ModelError::InvalidValue {
                model: "watermark".into(),
                field: "part_name".into(),
                message: format!("only partitioned tables have watermarks, got {part_name:?}"),
            });
        };

        let mut watermark = Self {
            create_time: fields.create_time,
            database: fields.database.to_lowercase(),
            schema: fields.schema.to_lowercase(),
            table: fields.table_name.to_lowercase(),
            partition_key: partition_key.to_string(),
            partition_value: partition_value.to_string(),
            part_type: fields.part_type.to_lowercase(),
            cluster: fields.cluster.to_lowercase(),
            cursor: GraphCursor::default(),
        };
        watermark.cursor = GraphCursor::new(vec![watermark.node()], vec![watermark.relation()]);
        Ok(watermark)
    }

    pub fn from_record(record: &Record, _keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields: WatermarkFields = de::from_record("watermark", record)?;
        Ok(Model::Watermark(Self::new(fields)?))
    }

    pub fn key(&self) -> String {
        format!(
            "{}://{}.{}/{}/{}/",
            self.database, self.cluster, self.schema, self.table, self.part_type
        )
    }

    pub fn table_key(&self) -> String {
        table_key(&self.database, &self.cluster, &self.schema, &self.table)
    }

    fn node(&self) -> GraphNode {
        GraphNode::new(self.key(), WATERMARK_NODE_LABEL)
            .with_attribute("partition_key", self.partition_key.as_str())
            .with_attribute("partition_value", self.partition_value.as_str())
            .with_attribute("create_time", self.create_time.as_str())
    }

    fn relation(&self) -> GraphRelationship {
        GraphRelationship::new(
            WATERMARK_NODE_LABEL,
            self.key(),
            TABLE_NODE_LABEL,
            self.table_key(),
            WATERMARK_TABLE_RELATION_TYPE,
            TABLE_WATERMARK_RELATION_TYPE,
        )
    }
}

impl GraphSerializable for Watermark {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.cursor.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.cursor.next_relation()
    }
}
