use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ScopedConfig;
use crate::context::{RunContext, SerializedKeys};
use crate::error::{ConfigError, TransformError};
use crate::models::ModelConstructor;
use crate::pipeline::Transformer;
use crate::transformer::expect_record;
use crate::types::Payload;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictToModelConfig {
    /// Registry name of the model to build.
    pub model_class: String,
}

/// Binds plain records to the configured model.
///
/// The model name is resolved once at `init`; a record that cannot be bound
/// is a record-level [`TransformError::Model`].
#[derive(Default)]
pub struct DictToModel {
    constructor: Option<ModelConstructor>,
    serialized: Arc<SerializedKeys>,
}

impl DictToModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for DictToModel {
    fn scope(&self) -> &str {
        "transformer.dict_to_model"
    }

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: DictToModelConfig = config.extract()?;
        if conf.model_class.is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("{}.model_class", config.scope()),
            });
        }
        self.constructor = Some(ctx.registry.resolve(&conf.model_class)?);
        self.serialized = Arc::clone(&ctx.serialized);
        Ok(())
    }

    fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError> {
        let record = expect_record(self.scope(), payload)?;
        let constructor = self.constructor.ok_or_else(|| TransformError::Field {
            field: "model_class".into(),
            message: "transformer used before init".into(),
        })?;
        let model = constructor(&record, &self.serialized)?;
        Ok(Some(Payload::Model(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::error::ModelError;
    use serde_json::json;

    fn init(model_class: &str) -> Result<DictToModel, ConfigError> {
        let config = JobConfig::from_value(json!({
            "transformer": {"dict_to_model": {"model_class": model_class}}
        }));
        let mut transformer = DictToModel::new();
        transformer.init(
            &config.scoped("transformer.dict_to_model"),
            &RunContext::default(),
        )?;
        Ok(transformer)
    }

    #[test]
    fn test_binds_record() {
        let mut transformer = init("dashboard_last_modified_timestamp").unwrap();
        let record = json!({
            "dashboard_group_id": "g",
            "dashboard_id": "d",
            "last_modified_timestamp": "1590000000",
            "product": "tableau",
        });
        let payload = transformer
            .transform(Payload::Record(record.as_object().unwrap().clone()))
            .unwrap()
            .unwrap();
        assert_eq!(payload.kind(), "dashboard_last_modified_timestamp");
    }

    #[test]
    fn test_run_keys_shared_across_records() {
        use crate::graph::GraphSerializable;

        let mut transformer = init("metric_metadata").unwrap();
        let record = json!({
            "dashboard_group": "sales",
            "dashboard_name": "weekly",
            "name": "revenue",
            "expression": "sum(amount)",
            "type": "sum",
        });
        let mut counts = Vec::new();
        for _ in 0..2 {
            let payload = transformer
                .transform(Payload::Record(record.as_object().unwrap().clone()))
                .unwrap()
                .unwrap();
            let Payload::Model(mut model) = payload else {
                panic!("expected a model");
            };
            counts.push((
                model.drain_nodes().unwrap().len(),
                model.drain_relations().unwrap().len(),
            ));
        }
        assert_eq!(counts, vec![(2, 2), (1, 0)]);
    }

    #[test]
    fn test_unknown_model_is_config_error() {
        let err = init("table_metadata").err().unwrap();
        assert!(matches!(err, ConfigError::Model(ModelError::UnknownModel { .. })));
    }

    #[test]
    fn test_bad_record_is_model_error() {
        let mut transformer = init("watermark").unwrap();
        let record = json!({"database": "hive"});
        let err = transformer
            .transform(Payload::Record(record.as_object().unwrap().clone()))
            .unwrap_err();
        assert!(matches!(err, TransformError::Model(ModelError::InvalidRecord { .. })));
    }

    #[test]
    fn test_rejects_models() {
        let mut transformer = init("watermark").unwrap();
        let record = json!({
            "create_time": "t",
            "database": "hive",
            "schema": "s",
            "table_name": "t",
            "part_name": "ds=1",
        });
        let model = transformer
            .transform(Payload::Record(record.as_object().unwrap().clone()))
            .unwrap()
            .unwrap();
        assert!(matches!(
            transformer.transform(model),
            Err(TransformError::UnsupportedPayload { .. })
        ));
    }
}
