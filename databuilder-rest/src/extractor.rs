use async_trait::async_trait;
use databuilder_core::config::ScopedConfig;
use databuilder_core::context::{RunContext, SerializedKeys};
use databuilder_core::error::{ConfigError, ExtractError};
use databuilder_core::models::ModelConstructor;
use databuilder_core::pipeline::Extractor;
use databuilder_core::{Payload, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::RestApiChainConfig;
use crate::query::RestQuery;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RestApiExtractorConfig {
    pub chain: RestApiChainConfig,
    /// Fields set on every extracted record.
    pub static_record: Record,
    /// Bind each record to this model instead of yielding plain records.
    pub model_class: Option<String>,
}

/// Drives a REST query chain, one record per `extract` call.
#[derive(Default)]
pub struct RestApiExtractor {
    query: Option<Box<dyn RestQuery>>,
    static_record: Record,
    constructor: Option<ModelConstructor>,
    serialized: Arc<SerializedKeys>,
}

impl RestApiExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already built chain instead of one described in configuration.
    pub fn with_query(query: Box<dyn RestQuery>) -> Self {
        Self {
            query: Some(query),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Extractor for RestApiExtractor {
    fn scope(&self) -> &str {
        "extractor.restapi"
    }

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: RestApiExtractorConfig = config.extract()?;
        if self.query.is_none() {
            let query = conf
                .chain
                .build(&reqwest::Client::new())
                .map_err(|e| ConfigError::Invalid {
                    scope: config.scope().to_string(),
                    message: e.to_string(),
                })?;
            debug!(steps = conf.chain.steps.len(), "Built REST query chain");
            self.query = Some(query);
        }

        if let Some(model_class) = &conf.model_class {
            self.constructor = Some(ctx.registry.resolve(model_class)?);
        }
        self.static_record = conf.static_record;
        self.serialized = Arc::clone(&ctx.serialized);
        Ok(())
    }

    async fn extract(&mut self) -> Result<Option<Payload>, ExtractError> {
        let Some(query) = self.query.as_mut() else {
            return Ok(None);
        };
        let Some(mut record) = query.next_record().await? else {
            self.query = None;
            return Ok(None);
        };

        for (name, value) in &self.static_record {
            record.insert(name.clone(), value.clone());
        }
        match self.constructor {
            Some(constructor) => Ok(Some(Payload::Model(constructor(
                &record,
                &self.serialized,
            )?))),
            None => Ok(Some(Payload::Record(record))),
        }
    }
}
