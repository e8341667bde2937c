//! Dashboard models.
//!
//! Every dashboard-scoped key derives from
//! `{product}_dashboard://{cluster}.{dashboard_group_id}/{dashboard_id}`.

pub mod execution;
pub mod last_execution;
pub mod last_modified;
pub mod metadata;
pub mod query;
pub mod table;

pub use execution::{DashboardExecution, DashboardExecutionFields};
pub use last_execution::{DashboardLastExecution, DashboardLastExecutionFields};
pub use last_modified::{DashboardLastModifiedTimestamp, DashboardLastModifiedTimestampFields};
pub use metadata::{DashboardMetadata, DashboardMetadataFields};
pub use query::{DashboardQuery, DashboardQueryFields};
pub use table::{DashboardTable, DashboardTableFields};

pub const DASHBOARD_NODE_LABEL: &str = "Dashboard";

pub(crate) fn default_cluster() -> String {
    "gold".to_string()
}

pub fn cluster_key(product: &str, cluster: &str) -> String {
    format!("{product}_dashboard://{cluster}")
}

pub fn dashboard_group_key(product: &str, cluster: &str, group_id: &str) -> String {
    format!("{}.{group_id}", cluster_key(product, cluster))
}

pub fn dashboard_key(product: &str, cluster: &str, group_id: &str, dashboard_id: &str) -> String {
    format!("{}/{dashboard_id}", dashboard_group_key(product, cluster, group_id))
}
