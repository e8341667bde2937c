use tracing::debug;

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, TransformError};
use crate::pipeline::Transformer;
use crate::types::Payload;

/// Applies transformers in order; stops as soon as one drops the payload.
#[derive(Default)]
pub struct ChainedTransformer {
    transformers: Vec<Box<dyn Transformer>>,
}

impl ChainedTransformer {
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self { transformers }
    }

    pub fn push(&mut self, transformer: Box<dyn Transformer>) {
        self.transformers.push(transformer);
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl Transformer for ChainedTransformer {
    fn scope(&self) -> &str {
        "transformer.chained"
    }

    /// Each member is initialized from its own scope, not from this one.
    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError> {
        for transformer in &mut self.transformers {
            let scope = config.with_scope(transformer.scope());
            transformer.init(&scope, ctx)?;
            debug!(scope = transformer.scope(), "Initialized chained transformer");
        }
        Ok(())
    }

    fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError> {
        let mut current = payload;
        for transformer in &mut self.transformers {
            match transformer.transform(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::transformer::{DictToModel, TemplateVariableSubstitution};
    use serde_json::json;

    struct DropAll;

    impl Transformer for DropAll {
        fn scope(&self) -> &str {
            "transformer.drop_all"
        }

        fn init(&mut self, _: &ScopedConfig, _: &RunContext) -> Result<(), ConfigError> {
            Ok(())
        }

        fn transform(&mut self, _: Payload) -> Result<Option<Payload>, TransformError> {
            Ok(None)
        }
    }

    const CONFIG: &str = r#"
        [transformer.template_variable_substitution]
        template = "{schema}.{table}"
        field_name = "table_name"

        [transformer.dict_to_model]
        model_class = "table_column_stats"
    "#;

    fn record() -> Payload {
        Payload::Record(
            json!({
                "schema": "core",
                "table": "users",
                "col_name": "id",
                "stat_name": "nulls",
                "stat_val": "0",
                "start_epoch": "1",
                "end_epoch": "2",
            })
            .as_object()
            .unwrap()
            .clone(),
        )
    }

    #[test]
    fn test_chain_applies_in_order() {
        let mut chain = ChainedTransformer::new(vec![
            Box::new(TemplateVariableSubstitution::new()),
            Box::new(DictToModel::new()),
        ]);
        let config = JobConfig::from_toml_str(CONFIG);
        chain
            .init(&config.scoped("transformer.chained"), &RunContext::default())
            .unwrap();

        let payload = chain.transform(record()).unwrap().unwrap();
        assert_eq!(payload.kind(), "table_column_stats");
    }

    #[test]
    fn test_chain_short_circuits() {
        let mut chain =
            ChainedTransformer::new(vec![Box::new(DropAll), Box::new(DictToModel::new())]);
        let config = JobConfig::from_toml_str(CONFIG);
        chain
            .init(&config.scoped("transformer.chained"), &RunContext::default())
            .unwrap();
        assert!(chain.transform(record()).unwrap().is_none());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_member_config_errors_propagate() {
        let mut chain = ChainedTransformer::default();
        chain.push(Box::new(DictToModel::new()));
        let err = chain
            .init(&ScopedConfig::empty("transformer.chained"), &RunContext::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }
}
