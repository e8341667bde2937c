//! # Databuilder Core
//!
//! Core library for databuilder.
//! Provides the property graph model, the publishable domain models, graph
//! CSV serializers, layered job configuration and the
//! extract/transform/load/publish pipeline.

pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod publisher;
pub mod serializers;
pub mod template;
pub mod transformer;
pub mod types;

// Re-export commonly used types at the crate root.
pub use config::{JobConfig, JobSpec, ScopedConfig};
pub use context::{RunContext, SerializedKeys};
pub use error::{
    ConfigError, DatabuilderError, ExtractError, GraphError, LoadError, ModelError, PipelineError,
    PublishError, TemplateError, TransformError,
};
pub use graph::{GraphCursor, GraphNode, GraphRelationship, GraphSerializable};
pub use models::{Model, ModelRegistry};
pub use pipeline::{
    DefaultJob, DefaultTask, Extractor, JobReport, Loader, PublishReport, Publisher, TaskReport,
    Transformer,
};
pub use serializers::GraphFormat;
pub use types::{Payload, Record};
