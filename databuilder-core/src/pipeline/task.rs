//! The default task: a pull loop from extractor to loader.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::context::RunContext;
use crate::error::{ExtractError, PipelineError, TransformError};
use crate::pipeline::{Extractor, Loader, Transformer};

pub const TASK_SCOPE: &str = "task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Uninitialized,
    Initialized,
    Extracting,
    Exhausted,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Uninitialized => write!(f, "uninitialized"),
            TaskState::Initialized => write!(f, "initialized"),
            TaskState::Extracting => write!(f, "extracting"),
            TaskState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// `[task]` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Abort the run when a record cannot be bound to its model.
    pub fail_on_model_error: bool,
    /// Log progress every this many extracted payloads; 0 disables.
    pub progress_report_frequency: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            fail_on_model_error: false,
            progress_report_frequency: 500,
        }
    }
}

/// Counters for one task run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    /// Payloads returned by the extractor.
    pub extracted: u64,
    /// Payloads a transformer chose to drop.
    pub dropped: u64,
    /// Payloads lost to a record-level error at any stage.
    pub failed: u64,
    /// Payloads handed to the loader.
    pub loaded: u64,
}

pub struct DefaultTask {
    extractor: Box<dyn Extractor>,
    transformer: Option<Box<dyn Transformer>>,
    loader: Box<dyn Loader>,
    config: TaskConfig,
    state: TaskState,
}

impl DefaultTask {
    pub fn new(extractor: Box<dyn Extractor>, loader: Box<dyn Loader>) -> Self {
        Self {
            extractor,
            transformer: None,
            loader,
            config: TaskConfig::default(),
            state: TaskState::Uninitialized,
        }
    }

    pub fn with_transformer(mut self, transformer: Box<dyn Transformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Initialize every component from its own scope of `config`.
    pub fn init(&mut self, config: &JobConfig, ctx: &RunContext) -> Result<(), PipelineError> {
        self.expect_state(TaskState::Uninitialized, TaskState::Initialized)?;

        self.config = config.scoped(TASK_SCOPE).extract()?;

        let scope = config.scoped(self.extractor.scope());
        self.extractor.init(&scope, ctx)?;
        if let Some(transformer) = self.transformer.as_mut() {
            let scope = config.scoped(transformer.scope());
            transformer.init(&scope, ctx)?;
        }
        let scope = config.scoped(self.loader.scope());
        self.loader.init(&scope, ctx)?;

        self.state = TaskState::Initialized;
        debug!(
            extractor = self.extractor.scope(),
            loader = self.loader.scope(),
            "Task initialized"
        );
        Ok(())
    }

    /// Drive the extractor to exhaustion.
    ///
    /// Record-level failures are logged and counted; anything else aborts the
    /// run after the loader has been closed.
    pub async fn run(&mut self) -> Result<TaskReport, PipelineError> {
        self.expect_state(TaskState::Initialized, TaskState::Extracting)?;
        self.state = TaskState::Extracting;

        let mut report = TaskReport::default();
        let result = self.pump(&mut report).await;
        let closed = self.loader.close();

        match (result, closed) {
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Failed to close loader after fatal error");
                }
                Err(e)
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Ok(()), Ok(())) => {
                self.state = TaskState::Exhausted;
                info!(
                    extracted = report.extracted,
                    loaded = report.loaded,
                    dropped = report.dropped,
                    failed = report.failed,
                    "Task finished"
                );
                Ok(report)
            }
        }
    }

    async fn pump(&mut self, report: &mut TaskReport) -> Result<(), PipelineError> {
        loop {
            let payload = match self.extractor.extract().await {
                Ok(Some(payload)) => payload,
                Ok(None) => return Ok(()),
                Err(e) if self.is_skippable_extract(&e) => {
                    warn!(scope = self.extractor.scope(), error = %e, "Dropping record");
                    report.failed += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            report.extracted += 1;
            self.report_progress(report.extracted);

            let payload = match self.transformer.as_mut() {
                None => payload,
                Some(transformer) => match transformer.transform(payload) {
                    Ok(Some(payload)) => payload,
                    Ok(None) => {
                        report.dropped += 1;
                        continue;
                    }
                    Err(e) if self.config.fail_on_model_error && is_model_error(&e) => {
                        return Err(e.into());
                    }
                    Err(e) => {
                        warn!(scope = transformer.scope(), error = %e, "Dropping record");
                        report.failed += 1;
                        continue;
                    }
                },
            };

            match self.loader.load(payload) {
                Ok(()) => report.loaded += 1,
                Err(e) if e.is_record_level() => {
                    warn!(scope = self.loader.scope(), error = %e, "Dropping record");
                    report.failed += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn is_skippable_extract(&self, error: &ExtractError) -> bool {
        if self.config.fail_on_model_error && matches!(error, ExtractError::Model(_)) {
            return false;
        }
        error.is_record_level()
    }

    fn report_progress(&self, extracted: u64) {
        let every = self.config.progress_report_frequency;
        if every > 0 && extracted % every == 0 {
            info!(records = extracted, "Extracted records");
        }
    }

    fn expect_state(&self, from: TaskState, to: TaskState) -> Result<(), PipelineError> {
        if self.state != from {
            return Err(PipelineError::InvalidState {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

fn is_model_error(error: &TransformError) -> bool {
    matches!(error, TransformError::Model(_))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ScopedConfig;
    use crate::error::{ConfigError, LoadError, ModelError};
    use crate::types::{Payload, Record};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Yields a fixed list of results.
    pub(crate) struct ScriptedExtractor {
        pub items: VecDeque<Result<Payload, ExtractError>>,
    }

    impl ScriptedExtractor {
        pub(crate) fn records(records: Vec<serde_json::Value>) -> Self {
            Self {
                items: records
                    .into_iter()
                    .filter_map(|v| v.as_object().cloned())
                    .map(|r| Ok(Payload::Record(r)))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        fn scope(&self) -> &str {
            "extractor.scripted"
        }

        fn init(&mut self, _: &ScopedConfig, _: &RunContext) -> Result<(), ConfigError> {
            Ok(())
        }

        async fn extract(&mut self) -> Result<Option<Payload>, ExtractError> {
            self.items.pop_front().transpose()
        }
    }

    /// Records loaded payloads into a shared vector.
    #[derive(Default, Clone)]
    pub(crate) struct CollectingLoader {
        pub loaded: Arc<Mutex<Vec<Payload>>>,
        pub closed: Arc<Mutex<bool>>,
    }

    impl Loader for CollectingLoader {
        fn scope(&self) -> &str {
            "loader.collecting"
        }

        fn init(&mut self, _: &ScopedConfig, _: &RunContext) -> Result<(), ConfigError> {
            Ok(())
        }

        fn load(&mut self, payload: Payload) -> Result<(), LoadError> {
            if let Payload::Record(record) = &payload {
                if record.contains_key("unloadable") {
                    return Err(LoadError::UnsupportedPayload {
                        scope: self.scope().into(),
                        payload: "record".into(),
                    });
                }
            }
            self.loaded.lock().unwrap().push(payload);
            Ok(())
        }

        fn close(&mut self) -> Result<(), LoadError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Drops records with `drop = true`, fails records with `bad = true`.
    struct FilterTransformer;

    impl Transformer for FilterTransformer {
        fn scope(&self) -> &str {
            "transformer.filter"
        }

        fn init(&mut self, _: &ScopedConfig, _: &RunContext) -> Result<(), ConfigError> {
            Ok(())
        }

        fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError> {
            let record: &Record = payload.as_record().unwrap();
            if record.get("drop") == Some(&json!(true)) {
                return Ok(None);
            }
            if record.get("bad") == Some(&json!(true)) {
                return Err(TransformError::Model(ModelError::InvalidRecord {
                    model: "watermark".into(),
                    message: "missing field".into(),
                }));
            }
            Ok(Some(payload))
        }
    }

    fn task(records: Vec<serde_json::Value>, loader: CollectingLoader) -> DefaultTask {
        DefaultTask::new(
            Box::new(ScriptedExtractor::records(records)),
            Box::new(loader),
        )
        .with_transformer(Box::new(FilterTransformer))
    }

    #[tokio::test]
    async fn test_run_counts_and_skips() {
        let loader = CollectingLoader::default();
        let mut task = task(
            vec![
                json!({"id": 1}),
                json!({"id": 2, "drop": true}),
                json!({"id": 3, "bad": true}),
                json!({"id": 4, "unloadable": 1}),
                json!({"id": 5}),
            ],
            loader.clone(),
        );
        assert_eq!(task.state(), TaskState::Uninitialized);
        task.init(&JobConfig::from_toml_str(""), &RunContext::default())
            .unwrap();
        assert_eq!(task.state(), TaskState::Initialized);

        let report = task.run().await.unwrap();
        assert_eq!(
            report,
            TaskReport {
                extracted: 5,
                dropped: 1,
                failed: 2,
                loaded: 2
            }
        );
        assert_eq!(task.state(), TaskState::Exhausted);
        assert!(*loader.closed.lock().unwrap());
        assert_eq!(loader.loaded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_model_errors_can_be_fatal() {
        let loader = CollectingLoader::default();
        let mut task = task(
            vec![json!({"id": 1}), json!({"id": 2, "bad": true}), json!({"id": 3})],
            loader.clone(),
        );
        let config = JobConfig::from_toml_str("[task]\nfail_on_model_error = true\n");
        task.init(&config, &RunContext::default()).unwrap();

        let err = task.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Transform(TransformError::Model(_))));
        assert_eq!(task.state(), TaskState::Extracting);
        assert_eq!(loader.loaded.lock().unwrap().len(), 1);
        assert!(*loader.closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_source_errors_are_fatal() {
        let mut extractor = ScriptedExtractor::records(vec![json!({"id": 1})]);
        extractor.items.push_back(Err(ExtractError::Record {
            message: "bad row".into(),
        }));
        extractor.items.push_back(Err(ExtractError::Source {
            source_name: "scripted".into(),
            message: "connection reset".into(),
        }));
        let loader = CollectingLoader::default();
        let mut task = DefaultTask::new(Box::new(extractor), Box::new(loader.clone()));
        task.init(&JobConfig::from_toml_str(""), &RunContext::default())
            .unwrap();

        let err = task.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Extract(ExtractError::Source { .. })));
        assert_eq!(loader.loaded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_state_transitions_are_enforced() {
        let mut task = task(vec![], CollectingLoader::default());
        assert!(matches!(
            task.run().await,
            Err(PipelineError::InvalidState { .. })
        ));

        let ctx = RunContext::default();
        task.init(&JobConfig::from_toml_str(""), &ctx).unwrap();
        assert!(matches!(
            task.init(&JobConfig::from_toml_str(""), &ctx),
            Err(PipelineError::InvalidState { .. })
        ));
        task.run().await.unwrap();
        assert!(task.run().await.is_err());
    }

    #[test]
    fn test_invalid_task_config_is_fatal() {
        let mut task = task(vec![], CollectingLoader::default());
        let config = JobConfig::from_toml_str("[task]\nfail_on_model_error = \"sometimes\"\n");
        assert!(matches!(
            task.init(&config, &RunContext::default()),
            Err(PipelineError::Config(_))
        ));
    }
}
