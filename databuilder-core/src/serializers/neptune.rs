//! Neptune bulk-load encoding.
//!
//! Vertex rows carry `~id`, `~label` and typed attribute columns
//! (`name:String`, `name:Long`, ...). Every relationship expands into a
//! forward and a reverse edge row.

use serde_json::Value;

use crate::graph::{GraphNode, GraphRelationship, UNQUOTED_SUFFIX};
use crate::serializers::Row;

pub const HEADER_ID: &str = "~id";
pub const HEADER_LABEL: &str = "~label";
pub const HEADER_FROM: &str = "~from";
pub const HEADER_TO: &str = "~to";

pub fn convert_node(node: &GraphNode) -> Row {
    let mut row: Row = vec![
        (HEADER_ID.to_string(), Value::from(node.key.as_str())),
        (HEADER_LABEL.to_string(), Value::from(node.label.as_str())),
    ];
    row.extend(typed_attributes(node.attributes.iter()));
    row
}

/// Forward and reverse edge rows.
pub fn convert_relationship(relationship: &GraphRelationship) -> [Row; 2] {
    let edge = |from: &str, to: &str, label: &str| {
        let mut row: Row = vec![
            (
                HEADER_ID.to_string(),
                Value::from(format!("{from}_{to}_{label}")),
            ),
            (HEADER_FROM.to_string(), Value::from(from)),
            (HEADER_TO.to_string(), Value::from(to)),
            (HEADER_LABEL.to_string(), Value::from(label)),
        ];
        row.extend(typed_attributes(relationship.attributes.iter()));
        row
    };

    [
        edge(
            &relationship.start_key,
            &relationship.end_key,
            &relationship.relationship_type,
        ),
        edge(
            &relationship.end_key,
            &relationship.start_key,
            &relationship.reverse_type,
        ),
    ]
}

/// Neptune column type of a value; `None` for null.
pub fn value_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some("Bool"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("Long"),
        Value::Number(_) => Some("Double"),
        Value::String(_) | Value::Array(_) | Value::Object(_) => Some("String"),
    }
}

fn typed_attributes<'a>(
    attributes: impl Iterator<Item = (&'a String, &'a Value)>,
) -> impl Iterator<Item = (String, Value)> {
    attributes.filter_map(|(name, value)| {
        let kind = value_type(value)?;
        let name = name.strip_suffix(UNQUOTED_SUFFIX).unwrap_or(name);
        let value = match value {
            Value::Array(_) | Value::Object(_) => Value::from(value.to_string()),
            other => other.clone(),
        };
        Some((format!("{name}:{kind}"), value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializers::header;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_convert_node_types() {
        let node = GraphNode::new("k", "Dashboard")
            .with_attribute("name", "revenue")
            .with_attribute("created_timestamp", 1590000000)
            .with_attribute("score", 0.5)
            .with_attribute("active", true)
            .with_attribute("gone", Value::Null)
            .with_unquoted_attribute("stat_val", 3);
        let row = convert_node(&node);
        assert_eq!(
            header(&row),
            vec![
                "~id",
                "~label",
                "active:Bool",
                "created_timestamp:Long",
                "name:String",
                "score:Double",
                "stat_val:Long"
            ]
        );
    }

    #[test]
    fn test_relationship_expands_to_two_edges() {
        let relationship = GraphRelationship::new(
            "Dashboard",
            "dash",
            "Query",
            "query",
            "HAS_QUERY",
            "QUERY_OF",
        );
        let [forward, reverse] = convert_relationship(&relationship);
        assert_eq!(forward[0].1, json!("dash_query_HAS_QUERY"));
        assert_eq!(forward[1].1, json!("dash"));
        assert_eq!(forward[3].1, json!("HAS_QUERY"));
        assert_eq!(reverse[0].1, json!("query_dash_QUERY_OF"));
        assert_eq!(reverse[1].1, json!("query"));
        assert_eq!(reverse[2].1, json!("dash"));
        assert_eq!(header(&reverse), vec!["~id", "~from", "~to", "~label"]);
    }
}
