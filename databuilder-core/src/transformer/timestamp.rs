use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, TransformError};
use crate::pipeline::Transformer;
use crate::transformer::expect_record;
use crate::types::Payload;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampStringToEpochConfig {
    pub field_name: String,
    /// `chrono` strftime format of the field.
    pub timestamp_format: String,
}

impl Default for TimestampStringToEpochConfig {
    fn default() -> Self {
        Self {
            field_name: String::new(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Replaces a UTC timestamp string field with its epoch seconds.
///
/// Records without the field (or with an empty one) pass through untouched.
/// Strings that do not match the format but are valid RFC 3339 are accepted
/// as well.
#[derive(Debug, Default)]
pub struct TimestampStringToEpoch {
    config: TimestampStringToEpochConfig,
}

impl TimestampStringToEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure directly, without a job configuration.
    pub fn with_config(config: TimestampStringToEpochConfig) -> Self {
        Self { config }
    }

    pub fn to_epoch(&self, timestamp: &str) -> Result<i64, TransformError> {
        NaiveDateTime::parse_from_str(timestamp, &self.config.timestamp_format)
            .map(|naive| naive.and_utc().timestamp())
            .or_else(|_| DateTime::parse_from_rfc3339(timestamp).map(|dt| dt.timestamp()))
            .map_err(|e| TransformError::Field {
                field: self.config.field_name.clone(),
                message: format!(
                    "{timestamp:?} does not match {:?}: {e}",
                    self.config.timestamp_format
                ),
            })
    }
}

impl Transformer for TimestampStringToEpoch {
    fn scope(&self) -> &str {
        "transformer.timestamp_str_to_epoch"
    }

    fn init(&mut self, config: &ScopedConfig, _ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: TimestampStringToEpochConfig = config.extract()?;
        if conf.field_name.is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("{}.field_name", config.scope()),
            });
        }
        self.config = conf;
        Ok(())
    }

    fn transform(&mut self, payload: Payload) -> Result<Option<Payload>, TransformError> {
        let mut record = expect_record(self.scope(), payload)?;
        let epoch = match record.get(&self.config.field_name) {
            Some(Value::String(s)) if !s.is_empty() => self.to_epoch(s)?,
            _ => {
                debug!(field = %self.config.field_name, "No timestamp string to convert");
                return Ok(Some(Payload::Record(record)));
            }
        };
        record.insert(self.config.field_name.clone(), Value::from(epoch));
        Ok(Some(Payload::Record(record)))
    }
}
