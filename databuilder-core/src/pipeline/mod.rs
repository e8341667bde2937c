//! The extract / transform / load / publish contracts and their drivers.
//!
//! A [`DefaultTask`] pulls payloads from an [`Extractor`] until exhausted,
//! passes each through a [`Transformer`] and hands the result to a
//! [`Loader`]. A [`DefaultJob`] runs the task and then a [`Publisher`] that
//! moves the loader's output to its destination.

pub mod job;
pub mod task;

pub use job::{DefaultJob, JobReport};
pub use task::{DefaultTask, TaskConfig, TaskReport, TaskState};

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, ExtractError, LoadError, PublishError, TransformError};
use crate::types::Payload;

/// Pull source yielding one payload per call until it returns `None`.
#[async_trait]
pub trait Extractor: Send {
    /// Dotted configuration scope, e.g. `extractor.csv`.
    fn scope(&self) -> &str;

    /// Resolve configuration. Errors here abort the job before extraction.
    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError>;

    async fn extract(&mut self) -> Result<Option<Payload>, ExtractError>;
}

/// Maps one payload to zero or one payload. `Ok(None)` drops the payload.
pub trait Transformer: Send {
    fn scope(&self) -> &str;

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError>;

    fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError>;
}

/// Sink for transformed payloads.
pub trait Loader: Send {
    fn scope(&self) -> &str;

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError>;

    fn load(&mut self, payload: Payload) -> Result<(), LoadError>;

    /// Flush buffered output. Called once after the extractor is exhausted.
    fn close(&mut self) -> Result<(), LoadError> {
        Ok(())
    }
}

/// Moves a loader's output to the destination store.
#[async_trait]
pub trait Publisher: Send {
    fn scope(&self) -> &str;

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError>;

    async fn publish(&mut self) -> Result<PublishReport, PublishError>;
}

/// What a publisher did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub files: usize,
    pub nodes: usize,
    pub relations: usize,
    pub output: Option<PathBuf>,
}
