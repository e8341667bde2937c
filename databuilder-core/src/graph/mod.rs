//! Property graph primitives.
//!
//! Domain models describe themselves as a finite sequence of [`GraphNode`]s
//! and [`GraphRelationship`]s. Every element is validated at the moment it is
//! pulled through [`GraphSerializable`], never at construction.

pub mod node;
pub mod relationship;
pub mod serializable;

pub use node::{GraphNode, UNQUOTED_SUFFIX};
pub use relationship::GraphRelationship;
pub use serializable::{
    GraphCursor, GraphSerializable, validate_label, validate_node, validate_relation,
    validate_relation_type,
};
