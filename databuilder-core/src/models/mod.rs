//! Domain models publishable to the metadata graph.
//!
//! Each model is built from a typed field struct (or from a plain record via
//! the [`ModelRegistry`]) and precomputes its nodes and relationships at
//! construction. [`Model`] is the closed set the pipeline moves around.

pub mod badge;
pub mod dashboard;
pub mod de;
pub mod metric;
pub mod registry;
pub mod table_stats;
pub mod watermark;

pub use badge::{Badge, BadgeMetadata};
pub use dashboard::{
    DashboardExecution, DashboardLastExecution, DashboardLastModifiedTimestamp, DashboardMetadata,
    DashboardQuery, DashboardTable,
};
pub use metric::MetricMetadata;
pub use registry::{ModelConstructor, ModelRegistry};
pub use table_stats::TableColumnStats;
pub use watermark::Watermark;

use crate::graph::{GraphNode, GraphRelationship, GraphSerializable};

pub const TABLE_NODE_LABEL: &str = "Table";
pub const COLUMN_NODE_LABEL: &str = "Column";
pub const CLUSTER_NODE_LABEL: &str = "Cluster";
pub const TAG_NODE_LABEL: &str = "Tag";

/// `{db}://{cluster}.{schema}/{table}`
pub fn table_key(db: &str, cluster: &str, schema: &str, table: &str) -> String {
    format!("{db}://{cluster}.{schema}/{table}")
}

#[derive(Debug, Clone)]
pub enum Model {
    Badge(BadgeMetadata),
    Watermark(Watermark),
    TableColumnStats(TableColumnStats),
    DashboardMetadata(DashboardMetadata),
    DashboardLastExecution(DashboardLastExecution),
    DashboardLastModifiedTimestamp(DashboardLastModifiedTimestamp),
    DashboardQuery(DashboardQuery),
    DashboardTable(DashboardTable),
    DashboardExecution(DashboardExecution),
    MetricMetadata(MetricMetadata),
}

impl Model {
    /// Registry name of the model.
    pub fn name(&self) -> &'static str {
        match self {
            Model::Badge(_) => "badge",
            Model::Watermark(_) => "watermark",
            Model::TableColumnStats(_) => "table_column_stats",
            Model::DashboardMetadata(_) => "dashboard_metadata",
            Model::DashboardLastExecution(_) => "dashboard_last_execution",
            Model::DashboardLastModifiedTimestamp(_) => "dashboard_last_modified_timestamp",
            Model::DashboardQuery(_) => "dashboard_query",
            Model::DashboardTable(_) => "dashboard_table",
            Model::DashboardExecution(_) => "dashboard_execution",
            Model::MetricMetadata(_) => "metric_metadata",
        }
    }

    fn inner(&mut self) -> &mut dyn GraphSerializable {
        match self {
            Model::Badge(m) => m,
            Model::Watermark(m) => m,
            Model::TableColumnStats(m) => m,
            Model::DashboardMetadata(m) => m,
            Model::DashboardLastExecution(m) => m,
            Model::DashboardLastModifiedTimestamp(m) => m,
            Model::DashboardQuery(m) => m,
            Model::DashboardTable(m) => m,
            Model::DashboardExecution(m) => m,
            Model::MetricMetadata(m) => m,
        }
    }
}

impl GraphSerializable for Model {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.inner().create_next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.inner().create_next_relation()
    }
}

macro_rules! impl_from_model {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Model {
                fn from(model: $variant) -> Self {
                    Model::$variant(model)
                }
            }
        )*
    };
}

impl_from_model!(
    Watermark,
    TableColumnStats,
    DashboardMetadata,
    DashboardLastExecution,
    DashboardLastModifiedTimestamp,
    DashboardQuery,
    DashboardTable,
    DashboardExecution,
    MetricMetadata,
);

impl From<BadgeMetadata> for Model {
    fn from(model: BadgeMetadata) -> Self {
        Model::Badge(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_delegates_to_variant() {
        let mut model: Model =
            BadgeMetadata::new("Table", "hive://gold.a/b", vec![Badge::new("beta", "status")])
                .into();
        assert_eq!(model.name(), "badge");
        assert_eq!(model.drain_nodes().unwrap().len(), 1);
        assert_eq!(model.drain_relations().unwrap().len(), 1);
        assert!(model.next_node().unwrap().is_none());
    }
}
