use serde_json::Value;

use crate::graph::{GraphNode, GraphRelationship};
use crate::serializers::Row;

pub const NODE_LABEL: &str = "LABEL";
pub const NODE_KEY: &str = "KEY";
pub const RELATION_START_LABEL: &str = "START_LABEL";
pub const RELATION_END_LABEL: &str = "END_LABEL";
pub const RELATION_START_KEY: &str = "START_KEY";
pub const RELATION_END_KEY: &str = "END_KEY";
pub const RELATION_TYPE: &str = "TYPE";
pub const RELATION_REVERSE_TYPE: &str = "REVERSE_TYPE";

/// `LABEL`, `KEY`, then attributes. Attribute names (including any
/// `:UNQUOTED` suffix) are kept verbatim.
pub fn serialize_node(node: &GraphNode) -> Row {
    let mut row: Row = vec![
        (NODE_LABEL.to_string(), Value::from(node.label.as_str())),
        (NODE_KEY.to_string(), Value::from(node.key.as_str())),
    ];
    row.extend(
        node.attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    row
}

pub fn serialize_relationship(relationship: &GraphRelationship) -> Row {
    let mut row: Row = [
        (RELATION_START_LABEL, &relationship.start_label),
        (RELATION_END_LABEL, &relationship.end_label),
        (RELATION_START_KEY, &relationship.start_key),
        (RELATION_END_KEY, &relationship.end_key),
        (RELATION_TYPE, &relationship.relationship_type),
        (RELATION_REVERSE_TYPE, &relationship.reverse_type),
    ]
    .into_iter()
    .map(|(column, value)| (column.to_string(), Value::from(value.as_str())))
    .collect();
    row.extend(
        relationship
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializers::header;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serialize_node() {
        let node = GraphNode::new("hive://gold.core/users/id/avg/", "Stat")
            .with_unquoted_attribute("stat_val", "1.5")
            .with_attribute("end_epoch", "2");
        let row = serialize_node(&node);
        assert_eq!(
            header(&row),
            vec!["LABEL", "KEY", "end_epoch", "stat_val:UNQUOTED"]
        );
        assert_eq!(row[0].1, json!("Stat"));
        assert_eq!(row[3].1, json!("1.5"));
    }

    #[test]
    fn test_serialize_relationship() {
        let relationship =
            GraphRelationship::new("Table", "t", "User", "u", "OWNER", "OWNER_OF")
                .with_attribute("since", 3);
        let row = serialize_relationship(&relationship);
        assert_eq!(
            header(&row),
            vec![
                "START_LABEL",
                "END_LABEL",
                "START_KEY",
                "END_KEY",
                "TYPE",
                "REVERSE_TYPE",
                "since"
            ]
        );
        assert_eq!(row[2].1, json!("t"));
        assert_eq!(row[6].1, json!(3));
    }
}
