//! Model registry: maps a configured model name to its constructor.
//!
//! `DictToModel` and the record-producing extractors look a name up once at
//! `init`, so an unknown `model_class` is a configuration error rather than a
//! per-record failure.

use std::collections::HashMap;
use tracing::debug;

use crate::context::SerializedKeys;
use crate::error::ModelError;
use crate::models::{
    BadgeMetadata, DashboardExecution, DashboardLastExecution, DashboardLastModifiedTimestamp,
    DashboardMetadata, DashboardQuery, DashboardTable, MetricMetadata, Model, TableColumnStats,
    Watermark,
};
use crate::types::Record;

/// Builds a model from a plain record within the current run.
pub type ModelConstructor = fn(&Record, &SerializedKeys) -> Result<Model, ModelError>;

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    constructors: HashMap<String, ModelConstructor>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every model shipped with this crate.
    pub fn with_builtins() -> Self {
        let builtins: [(&str, ModelConstructor); 10] = [
            ("badge", BadgeMetadata::from_record),
            ("watermark", Watermark::from_record),
            ("table_column_stats", TableColumnStats::from_record),
            ("dashboard_metadata", DashboardMetadata::from_record),
            ("dashboard_last_execution", DashboardLastExecution::from_record),
            (
                "dashboard_last_modified_timestamp",
                DashboardLastModifiedTimestamp::from_record,
            ),
            ("dashboard_query", DashboardQuery::from_record),
            ("dashboard_table", DashboardTable::from_record),
            ("dashboard_execution", DashboardExecution::from_record),
            ("metric_metadata", MetricMetadata::from_record),
        ];

        Self {
            constructors: builtins
                .into_iter()
                .map(|(name, constructor)| (name.to_string(), constructor))
                .collect(),
        }
    }

    /// Register a constructor. Returns error if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: ModelConstructor,
    ) -> Result<(), ModelError> {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(ModelError::AlreadyRegistered { name });
        }
        debug!(model = %name, "Registering model");
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Look up a constructor by name.
    pub fn resolve(&self, name: &str) -> Result<ModelConstructor, ModelError> {
        self.constructors
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownModel {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
