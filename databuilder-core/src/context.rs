//! Run-scoped state shared by every component of a single job launch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::graph::GraphRelationship;
use crate::models::ModelRegistry;

/// Shared nodes and relationships already emitted during the current run.
///
/// Models that own nodes shared across many records (a cluster, a dashboard
/// group, a metric type) `claim` the key before emitting the node; only the
/// first claimant in a run emits it. Relationships repeated across records
/// are claimed the same way with `claim_relation`.
#[derive(Debug, Default)]
pub struct SerializedKeys {
    nodes: Mutex<HashSet<String>>,
    relations: Mutex<HashSet<String>>,
}

impl SerializedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time the node `key` is claimed in this run.
    pub fn claim(&self, key: &str) -> bool {
        let mut nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner());
        if nodes.contains(key) {
            return false;
        }
        nodes.insert(key.to_string())
    }

    /// Returns `true` the first time this edge (both ends and type) is claimed.
    pub fn claim_relation(&self, relation: &GraphRelationship) -> bool {
        self.relations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(relation_key(relation))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    pub fn contains_relation(&self, relation: &GraphRelationship) -> bool {
        self.relations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&relation_key(relation))
    }

    /// Claimed nodes and relationships.
    pub fn len(&self) -> usize {
        let nodes = self.nodes.lock().unwrap_or_else(|e| e.into_inner()).len();
        nodes + self.relations.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every claimed key.
    pub fn clear(&self) {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.relations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

fn relation_key(relation: &GraphRelationship) -> String {
    format!(
        "({}:{})-[{}]->({}:{})",
        relation.start_label,
        relation.start_key,
        relation.relationship_type,
        relation.end_label,
        relation.end_key
    )
}

/// Everything a component may need that outlives a single record.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub serialized: Arc<SerializedKeys>,
    pub registry: Arc<ModelRegistry>,
}

impl RunContext {
    /// A fresh run with an empty de-duplication set.
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            serialized: Arc::new(SerializedKeys::new()),
            registry,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(Arc::new(ModelRegistry::with_builtins()))
    }
}
