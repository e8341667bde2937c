//! A job: one task followed by one publisher, inside a fresh run context.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::JobConfig;
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::models::ModelRegistry;
use crate::pipeline::{DefaultTask, PublishReport, Publisher, TaskReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub identifier: String,
    pub task: TaskReport,
    pub publish: PublishReport,
}

pub struct DefaultJob {
    identifier: String,
    config: JobConfig,
    task: DefaultTask,
    publisher: Box<dyn Publisher>,
    registry: Arc<ModelRegistry>,
}

impl DefaultJob {
    pub fn new(config: JobConfig, task: DefaultTask, publisher: Box<dyn Publisher>) -> Self {
        Self {
            identifier: "databuilder-job".to_string(),
            config,
            task,
            publisher,
            registry: Arc::new(ModelRegistry::with_builtins()),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Use a registry holding custom model constructors.
    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Run the task to exhaustion, then publish.
    ///
    /// Every launch gets its own [`RunContext`], so shared-node
    /// de-duplication never leaks between jobs.
    pub async fn launch(mut self) -> Result<JobReport, PipelineError> {
        let ctx = RunContext::new(Arc::clone(&self.registry));
        info!(run_id = %ctx.run_id, job = %self.identifier, "Launching job");

        self.task.init(&self.config, &ctx)?;
        let task = self.task.run().await?;

        let scope = self.config.scoped(self.publisher.scope());
        self.publisher.init(&scope, &ctx)?;
        let publish = self.publisher.publish().await?;

        info!(
            run_id = %ctx.run_id,
            job = %self.identifier,
            loaded = task.loaded,
            published_files = publish.files,
            "Job finished"
        );
        Ok(JobReport {
            run_id: ctx.run_id,
            identifier: self.identifier,
            task,
            publish,
        })
    }
}
