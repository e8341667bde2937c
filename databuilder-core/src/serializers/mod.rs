//! Row encodings of graph elements for bulk loaders.
//!
//! A row is an ordered list of `(column, value)` pairs; reserved columns come
//! first, attribute columns follow in key order.

pub mod neo4j;
pub mod neptune;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Row = Vec<(String, Value)>;

/// Target bulk-load format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    #[default]
    Neo4j,
    Neptune,
}

impl std::fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphFormat::Neo4j => write!(f, "neo4j"),
            GraphFormat::Neptune => write!(f, "neptune"),
        }
    }
}

/// Column names of a row, in order.
pub fn header(row: &Row) -> Vec<String> {
    row.iter().map(|(column, _)| column.clone()).collect()
}
