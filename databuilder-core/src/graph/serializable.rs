//! The pull contract every publishable model implements.

use crate::error::GraphError;
use crate::graph::{GraphNode, GraphRelationship};

/// A model that can enumerate the graph nodes and relationships it owns.
///
/// Implementors supply `create_next_node` / `create_next_relation`; callers use
/// `next_node` / `next_relation`, which validate each element before handing
/// it out. Both sequences are finite and single-pass: once `None` is
/// returned, every later call returns `None` as well.
pub trait GraphSerializable {
    /// Produce the next raw node, or `None` when exhausted.
    fn create_next_node(&mut self) -> Option<GraphNode>;

    /// Produce the next raw relationship, or `None` when exhausted.
    fn create_next_relation(&mut self) -> Option<GraphRelationship>;

    /// Next validated node.
    fn next_node(&mut self) -> Result<Option<GraphNode>, GraphError> {
        match self.create_next_node() {
            Some(node) => {
                validate_node(&node)?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    /// Next validated relationship.
    fn next_relation(&mut self) -> Result<Option<GraphRelationship>, GraphError> {
        match self.create_next_relation() {
            Some(relation) => {
                validate_relation(&relation)?;
                Ok(Some(relation))
            }
            None => Ok(None),
        }
    }

    /// Pull and validate every remaining node.
    fn drain_nodes(&mut self) -> Result<Vec<GraphNode>, GraphError> {
        let mut nodes = Vec::new();
        while let Some(node) = self.next_node()? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Pull and validate every remaining relationship.
    fn drain_relations(&mut self) -> Result<Vec<GraphRelationship>, GraphError> {
        let mut relations = Vec::new();
        while let Some(relation) = self.next_relation()? {
            relations.push(relation);
        }
        Ok(relations)
    }
}

/// Index cursor over node and relationship lists computed at construction.
#[derive(Debug, Clone, Default)]
pub struct GraphCursor {
    nodes: std::vec::IntoIter<GraphNode>,
    relations: std::vec::IntoIter<GraphRelationship>,
}

impl GraphCursor {
    pub fn new(nodes: Vec<GraphNode>, relations: Vec<GraphRelationship>) -> Self {
        Self {
            nodes: nodes.into_iter(),
            relations: relations.into_iter(),
        }
    }

    pub fn next_node(&mut self) -> Option<GraphNode> {
        self.nodes.next()
    }

    pub fn next_relation(&mut self) -> Option<GraphRelationship> {
        self.relations.next()
    }

    pub fn remaining_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn remaining_relations(&self) -> usize {
        self.relations.len()
    }
}

impl GraphSerializable for GraphCursor {
    fn create_next_node(&mut self) -> Option<GraphNode> {
        self.next_node()
    }

    fn create_next_relation(&mut self) -> Option<GraphRelationship> {
        self.next_relation()
    }
}

/// A label is a single capitalized word: first character upper case, no whitespace.
pub fn validate_label(label: &str) -> Result<(), GraphError> {
    let capitalized = label.chars().next().is_some_and(char::is_uppercase);
    if !capitalized || label.chars().any(char::is_whitespace) {
        return Err(GraphError::InvalidLabel {
            label: label.to_string(),
        });
    }
    Ok(())
}

/// Relationship types must already be upper case.
pub fn validate_relation_type(value: &str) -> Result<(), GraphError> {
    if value.is_empty() || value != value.to_uppercase() {
        return Err(GraphError::InvalidRelationType {
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn validate_node(node: &GraphNode) -> Result<(), GraphError> {
    require("key", &node.key)?;
    require("label", &node.label)?;
    validate_label(&node.label)
}

pub fn validate_relation(relation: &GraphRelationship) -> Result<(), GraphError> {
    require("start_key", &relation.start_key)?;
    require("end_key", &relation.end_key)?;
    validate_label(&relation.start_label)?;
    validate_label(&relation.end_label)?;
    validate_relation_type(&relation.relationship_type)?;
    validate_relation_type(&relation.reverse_type)
}

fn require(field: &str, value: &str) -> Result<(), GraphError> {
    if value.is_empty() {
        return Err(GraphError::MissingRequiredField {
            field: field.to_string(),
        });
    }
    Ok(())
}
