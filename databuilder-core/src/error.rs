//! Error types for the databuilder core library.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering graph validation, model construction, configuration, and each
//! stage of the extract/transform/load pipeline.

use std::path::PathBuf;

/// Top-level error type for the databuilder core library.
#[derive(Debug, thiserror::Error)]
pub enum DatabuilderError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural violations detected when a node or relationship is about to be emitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("LABEL should only have upper case character on its first one: {label:?}")]
    InvalidLabel { label: String },

    #[error("TYPE needs to be upper case: {value:?}")]
    InvalidRelationType { value: String },

    #[error("Required attribute missing: {field}")]
    MissingRequiredField { field: String },
}

/// Errors raised while building a domain model from its fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Cannot build '{model}' from record: {message}")]
    InvalidRecord { model: String, message: String },

    #[error("Invalid value for '{model}.{field}': {message}")]
    InvalidValue {
        model: String,
        field: String,
        message: String,
    },

    #[error("Unknown model class: {name}")]
    UnknownModel { name: String },

    #[error("Model class already registered: {name}")]
    AlreadyRegistered { name: String },
}

/// Errors from rendering a `{field}` template against a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Field '{field}' referenced by template {template:?} is missing from the record")]
    MissingField { field: String, template: String },

    #[error("Unclosed placeholder in template {template:?}")]
    Unclosed { template: String },
}

/// Errors from the layered job configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration for '{scope}': {message}")]
    Invalid { scope: String, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },

    #[error("Unknown component '{name}' for {kind}")]
    UnknownComponent { kind: String, name: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors raised by an extractor while pulling the next record.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The current record could not be produced; the source can continue.
    #[error("Failed to extract record: {message}")]
    Record { message: String },

    /// The record was read but could not be bound to its model.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The source itself failed; extraction cannot continue.
    #[error("Source '{source_name}' failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// The source failed with an error of its own type; extraction cannot continue.
    #[error("Source '{source_name}' failed: {source}")]
    Upstream {
        source_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether the run may continue with the next record after this error.
    pub fn is_record_level(&self) -> bool {
        matches!(self, ExtractError::Record { .. } | ExtractError::Model(_))
    }
}

/// Errors raised by a transformer for a single record.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Field '{field}': {message}")]
    Field { field: String, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Transformer '{scope}' cannot handle {payload} payloads")]
    UnsupportedPayload { scope: String, payload: String },
}

/// Errors raised by a loader.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Loader '{scope}' cannot handle {payload} payloads")]
    UnsupportedPayload { scope: String, payload: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Whether the run may continue with the next record after this error.
    pub fn is_record_level(&self) -> bool {
        matches!(self, LoadError::UnsupportedPayload { .. })
    }
}

/// Errors raised by a publisher.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Column '{column}' in {path} must hold a number or a boolean, got {value:?}")]
    InvalidUnquotedValue {
        column: String,
        value: String,
        path: PathBuf,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from driving a task or job.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid task state transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Transformation failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Loading failed: {0}")]
    Load(#[from] LoadError),

    #[error("Publishing failed: {0}")]
    Publish(#[from] PublishError),
}

/// A convenience Result type for databuilder operations.
pub type Result<T> = std::result::Result<T, DatabuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_display() {
        let err = GraphError::InvalidLabel {
            label: "dashboard".into(),
        };
        assert_eq!(
            err.to_string(),
            "LABEL should only have upper case character on its first one: \"dashboard\""
        );

        let err = GraphError::InvalidRelationType {
            value: "Owner_of".into(),
        };
        assert!(err.to_string().contains("Owner_of"));
    }

    #[test]
    fn test_error_conversion() {
        let graph_err = GraphError::MissingRequiredField {
            field: "key".into(),
        };
        let err: DatabuilderError = graph_err.into();
        assert!(matches!(err, DatabuilderError::Graph(_)));

        let model_err = ModelError::UnknownModel {
            name: "nope".into(),
        };
        let config_err: ConfigError = model_err.into();
        assert!(config_err.to_string().contains("nope"));
    }

    #[test]
    fn test_record_level_classification() {
        assert!(
            ExtractError::Record {
                message: "bad row".into()
            }
            .is_record_level()
        );
        assert!(
            !ExtractError::Source {
                source_name: "csv".into(),
                message: "gone".into()
            }
            .is_record_level()
        );
        assert!(
            LoadError::UnsupportedPayload {
                scope: "loader.x".into(),
                payload: "record".into()
            }
            .is_record_level()
        );
        assert!(!LoadError::Graph(GraphError::InvalidLabel { label: "x".into() }).is_record_level());
    }
}
