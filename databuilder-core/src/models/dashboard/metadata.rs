use serde::Deserialize;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
use crate::models::dashboard::{
    DASHBOARD_NODE_LABEL, cluster_key, dashboard_group_key, dashboard_key, default_cluster,
};
use crate::models::{CLUSTER_NODE_LABEL, Model, TAG_NODE_LABEL, de};
use crate::types::Record;

pub const DASHBOARD_GROUP_NODE_LABEL: &str = "Dashboardgroup";
pub const DESCRIPTION_NODE_LABEL: &str = "Description";

pub const CLUSTER_DASHBOARD_GROUP_RELATION_TYPE: &str = "DASHBOARD_GROUP";
pub const DASHBOARD_GROUP_CLUSTER_RELATION_TYPE: &str = "DASHBOARD_GROUP_OF";
pub const DASHBOARD_GROUP_DASHBOARD_RELATION_TYPE: &str = "DASHBOARD";
pub const DASHBOARD_DASHBOARD_GROUP_RELATION_TYPE: &str = "DASHBOARD_OF";
pub const DESCRIPTION_RELATION_TYPE: &str = "DESCRIPTION";
pub const DESCRIPTION_OF_RELATION_TYPE: &str = "DESCRIPTION_OF";
pub const DASHBOARD_TAG_RELATION_TYPE: &str = "TAG";
pub const TAG_DASHBOARD_RELATION_TYPE: &str = "TAG_OF";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardMetadataFields {
    #[serde(deserialize_with = "de::string")]
    pub dashboard_group: String,
    #[serde(deserialize_with = "de::string")]
    pub dashboard_name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub tags: Vec<String>,
    #[serde(default = "default_cluster", deserialize_with = "de::string")]
    pub cluster: String,
    #[serde(default, deserialize_with = "de::string")]
    pub product: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dashboard_group_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dashboard_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dashboard_group_description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub created_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dashboard_group_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub dashboard_url: Option<String>,
}

/// A dashboard with its group, cluster, descriptions and tags.
///
/// The cluster and dashboard group nodes are shared by every dashboard of the
/// group; they are emitted only by the first dashboard of the run that claims
/// their key in [`SerializedKeys`]. Relationships are always emitted.
#[derive(Debug, Clone)]
pub struct DashboardMetadata {
    pub fields: DashboardMetadataFields,
    cursor: GraphCursor,
}

impl DashboardMetadata {
    pub fn new(fields: DashboardMetadataFields, keys: &SerializedKeys) -> Self {
        let mut metadata = Self {
            fields,
            cursor: GraphCursor::default(),
        };
        metadata.cursor = GraphCursor::new(metadata.nodes(keys), metadata.relations());
        metadata
    }

    pub fn from_record(record: &Record, keys: &SerializedKeys) -> Result<Model, ModelError> {
        let fields: DashboardMetadataFields = de::from_record("dashboard_metadata", record)?;
        Ok(Model::DashboardMetadata(Self::new(fields, keys)))
    }

    pub fn group_id(&self) -> &str {
        self.fields
            .dashboard_group_id
            .as_deref()
            .unwrap_or(&self.fields.dashboard_group)
    }

    pub fn dashboard_id(&self) -> &str {
        self.fields
            .dashboard_id
            .as_deref()
            .unwrap_or(&self.fields.dashboard_name)
    }

    pub fn cluster_key(&self) -> String {
        cluster_key(&self.fields.product, &self.fields.cluster)
    }

    pub fn dashboard_group_key(&self) -> String {
        dashboard_group_key(&self.fields.product, &self.fields.cluster, self.group_id())
    }

    pub fn dashboard_key(&self) -> String {
        dashboard_key(
            &self.fields.product,
            &self.fields.cluster,
            self.group_id(),
            self.dashboard_id(),
        )
    }

    fn description_key(&self) -> String {
        format!("{}/_description", self.dashboard_key())
    }

    fn group_description_key(&self) -> String {
        format!("{}/_description", self.dashboard_group_key())
    }

    fn nodes(&self, keys: &SerializedKeys) -> Vec<GraphNode> {
        let f = &self.fields;
        let mut nodes = Vec::new();

        let cluster_key = self.cluster_key();
        if keys.claim(&cluster_key) {
            nodes.push(
                GraphNode::new(cluster_key, CLUSTER_NODE_LABEL)
                    .with_attribute("name", f.cluster.as_str()),
            );
        }

        nodes.push(
            GraphNode::new(self.dashboard_key(), DASHBOARD_NODE_LABEL)
                .with_attribute("name", f.dashboard_name.as_str())
                .with_optional_attribute("created_timestamp", f.created_timestamp)
                .with_optional_attribute("dashboard_url", f.dashboard_url.clone()),
        );

        let group_key = self.dashboard_group_key();
        if !f.dashboard_group.is_empty() && keys.claim(&group_key) {
            nodes.push(
                GraphNode::new(group_key, DASHBOARD_GROUP_NODE_LABEL)
                    .with_attribute("name", f.dashboard_group.as_str())
                    .with_optional_attribute("dashboard_group_url", f.dashboard_group_url.clone()),
            );
        }

        if let Some(description) = &f.dashboard_group_description {
            nodes.push(
                GraphNode::new(self.group_description_key(), DESCRIPTION_NODE_LABEL)
                    .with_attribute("description", description.as_str()),
            );
        }

        if let Some(description) = &f.description {
            nodes.push(
                GraphNode::new(self.description_key(), DESCRIPTION_NODE_LABEL)
                    .with_attribute("description", description.as_str()),
            );
        }

        for tag in &f.tags {
            nodes.push(GraphNode::new(tag, TAG_NODE_LABEL).with_attribute("tag_type", "dashboard"));
        }

        nodes
    }

    fn relations(&self) -> Vec<GraphRelationship> {
        let f = &self.fields;
        let dashboard_key = self.dashboard_key();
        let group_key = self.dashboard_group_key();
        let mut relations = vec![GraphRelationship::new(
            CLUSTER_NODE_LABEL,
            self.cluster_key(),
            DASHBOARD_GROUP_NODE_LABEL,
            &group_key,
            CLUSTER_DASHBOARD_GROUP_RELATION_TYPE,
            DASHBOARD_GROUP_CLUSTER_RELATION_TYPE,
        )];

        if f.dashboard_group_description.is_some() {
            relations.push(GraphRelationship::new(
                DASHBOARD_GROUP_NODE_LABEL,
                &group_key,
                DESCRIPTION_NODE_LABEL,
                self.group_description_key(),
                DESCRIPTION_RELATION_TYPE,
                DESCRIPTION_OF_RELATION_TYPE,
            ));
        }

        relations.push(GraphRelationship::new(
            DASHBOARD_NODE_LABEL,
            &dashboard_key,
            DASHBOARD_GROUP_NODE_LABEL,
            &group_key,
            DASHBOARD_DASHBOARD_GROUP_RELATION_TYPE,
            DASHBOARD_GROUP_DASHBOARD_RELATION_TYPE,
        ));

        if f.description.is_some() {
            relations.push(GraphRelationship::new(
                DASHBOARD_NODE_LABEL,
                &dashboard_key,
                DESCRIPTION_NODE_LABEL,
                self.description_key(),
                DESCRIPTION_RELATION_TYPE,
                DESCRIPTION_OF_RELATION_TYPE,
            ));
        }

        for tag in &f.tags {
            relations.push(GraphRelationship::new(
                DASHBOARD_NODE_LABEL,
                &dashboard_key,
                TAG_NODE_LABEL,
                tag,
                DASHBOARD_TAG_RELATION_TYPE,
                TAG_DASHBOARD_RELATION_TYPE,
            ));
        }

        relations
    }
}

impl GraphSerializable for DashboardMetadata {
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
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(name: &str) -> DashboardMetadataFields {
        DashboardMetadataFields {
            dashboard_group: "Product - Jobs.cz".into(),
            dashboard_name: name.into(),
            description: Some("Jobs.cz dashboard".into()),
            tags: vec!["test_tag".into(), "tag2".into()],
            cluster: default_cluster(),
            product: "mode".into(),
            dashboard_group_id: Some("jobs".into()),
            dashboard_id: Some(name.to_lowercase()),
            dashboard_group_description: None,
            created_timestamp: Some(123456789),
            dashboard_group_url: Some("https://mode.com/jobs".into()),
            dashboard_url: None,
        }
    }

    #[test]
    fn test_nodes_and_relations() {
        let keys = SerializedKeys::new();
        let mut dashboard = DashboardMetadata::new(fields("Agent"), &keys);

        let nodes = dashboard.drain_nodes().unwrap();
        let labels: Vec<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Cluster", "Dashboard", "Dashboardgroup", "Description", "Tag", "Tag"]
        );
        assert_eq!(nodes[0].key, "mode_dashboard://gold");
        assert_eq!(nodes[1].key, "mode_dashboard://gold.jobs/agent");
        assert_eq!(nodes[1].attributes["created_timestamp"], json!(123456789));
        assert!(!nodes[1].attributes.contains_key("dashboard_url"));
        assert_eq!(nodes[2].key, "mode_dashboard://gold.jobs");
        assert_eq!(nodes[3].key, "mode_dashboard://gold.jobs/agent/_description");
        assert_eq!(nodes[4].attributes["tag_type"], json!("dashboard"));

        let relations = dashboard.drain_relations().unwrap();
        let types: Vec<&str> = relations
            .iter()
            .map(|r| r.relationship_type.as_str())
            .collect();
        assert_eq!(
            types,
            vec!["DASHBOARD_GROUP", "DASHBOARD_OF", "DESCRIPTION", "TAG", "TAG"]
        );
    }

    #[test]
    fn test_shared_nodes_emitted_once_per_run() {
        let keys = SerializedKeys::new();
        let mut first = DashboardMetadata::new(fields("Agent"), &keys);
        let mut second = DashboardMetadata::new(fields("Employer"), &keys);

        let mut all = first.drain_nodes().unwrap();
        all.extend(second.drain_nodes().unwrap());
        let count = |label: &str| all.iter().filter(|n| n.label == label).count();
        assert_eq!(count("Cluster"), 1);
        assert_eq!(count("Dashboardgroup"), 1);
        assert_eq!(count("Dashboard"), 2);

        // both still link to the shared group
        assert_eq!(second.drain_relations().unwrap().len(), 5);

        let fresh_run = SerializedKeys::new();
        let mut third = DashboardMetadata::new(fields("Agent"), &fresh_run);
        assert_eq!(third.next_node().unwrap().unwrap().label, "Cluster");
    }

    #[test]
    fn test_ids_fall_back_to_names() {
        let record = json!({
            "dashboard_group": "sales",
            "dashboard_name": "revenue",
            "tags": "a,b",
        });
        let model =
            DashboardMetadata::from_record(record.as_object().unwrap(), &SerializedKeys::new())
                .unwrap();
        let Model::DashboardMetadata(dashboard) = model else {
            panic!("expected dashboard metadata");
        };
        assert_eq!(dashboard.dashboard_key(), "_dashboard://gold.sales/revenue");
        assert_eq!(dashboard.fields.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_required_field() {
        let record = json!({"dashboard_group": "sales"});
        let err =
            DashboardMetadata::from_record(record.as_object().unwrap(), &SerializedKeys::new())
                .unwrap_err();
        assert!(err.to_string().contains("dashboard_name"));
    }
}
