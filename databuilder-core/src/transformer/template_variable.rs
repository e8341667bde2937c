use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, TransformError};
use crate::pipeline::Transformer;
use crate::template::render_template;
use crate::transformer::expect_record;
use crate::types::Payload;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateVariableConfig {
    /// e.g. `{database}://{cluster}.{schema}/{table}`
    pub template: String,
    /// Field the rendered string is written to.
    pub field_name: String,
}

/// Writes a template rendered from the record's own fields into `field_name`.
#[derive(Debug, Default)]
pub struct TemplateVariableSubstitution {
    config: TemplateVariableConfig,
}

impl TemplateVariableSubstitution {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for TemplateVariableSubstitution {
    fn scope(&self) -> &str {
        "transformer.template_variable_substitution"
    }

    fn init(&mut self, config: &ScopedConfig, _ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: TemplateVariableConfig = config.extract()?;
        for (name, value) in [("template", &conf.template), ("field_name", &conf.field_name)] {
            if value.is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.{name}", config.scope()),
                });
            }
        }
        self.config = conf;
        Ok(())
    }

    fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError> {
        let mut record = expect_record(self.scope(), payload)?;
        let rendered = render_template(&self.config.template, &record)?;
        record.insert(self.config.field_name.clone(), Value::String(rendered));
        Ok(Some(Payload::Record(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::error::TemplateError;
    use serde_json::json;

    fn transformer() -> TemplateVariableSubstitution {
        let config = JobConfig::from_toml_str(
            r#"
            [transformer.template_variable_substitution]
            template = "{product}_dashboard://{cluster}.{group}"
            field_name = "dashboard_group_key"
            "#,
        );
        let mut transformer = TemplateVariableSubstitution::new();
        transformer
            .init(
                &config.scoped("transformer.template_variable_substitution"),
                &RunContext::default(),
            )
            .unwrap();
        transformer
    }

    #[test]
    fn test_substitution() {
        let record = json!({"product": "mode", "cluster": "gold", "group": 7});
        let payload = transformer()
            .transform(Payload::Record(record.as_object().unwrap().clone()))
            .unwrap()
            .unwrap();
        let record = payload.as_record().unwrap();
        assert_eq!(record["dashboard_group_key"], json!("mode_dashboard://gold.7"));
        assert_eq!(record["group"], json!(7));
    }

    #[test]
    fn test_missing_variable() {
        let record = json!({"product": "mode"});
        let err = transformer()
            .transform(Payload::Record(record.as_object().unwrap().clone()))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Template(TemplateError::MissingField { ref field, .. }) if field == "cluster"
        ));
    }

    #[test]
    fn test_requires_template() {
        let mut transformer = TemplateVariableSubstitution::new();
        let err = transformer
            .init(
                &ScopedConfig::empty("transformer.template_variable_substitution"),
                &RunContext::default(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("template"));
    }
}
