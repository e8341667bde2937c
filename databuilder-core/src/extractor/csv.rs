use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::ScopedConfig;
use crate::context::{RunContext, SerializedKeys};
use crate::error::{ConfigError, ExtractError};
use crate::models::ModelConstructor;
use crate::pipeline::Extractor;
use crate::types::{Payload, Record};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvExtractorConfig {
    pub file_location: PathBuf,
    /// Bind each row to this model instead of yielding plain records.
    pub model_class: Option<String>,
}

/// One payload per CSV row; header names become field names.
#[derive(Default)]
pub struct CsvExtractor {
    reader: Option<csv::Reader<File>>,
    headers: Vec<String>,
    constructor: Option<ModelConstructor>,
    serialized: Arc<SerializedKeys>,
    row: u64,
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_record(&self, row: &csv::StringRecord) -> Record {
        self.headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), Value::String(value.to_string())))
            .collect()
    }
}

#[async_trait]
impl Extractor for CsvExtractor {
    fn scope(&self) -> &str {
        "extractor.csv"
    }

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: CsvExtractorConfig = config.extract()?;
        if conf.file_location.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("{}.file_location", config.scope()),
            });
        }

        let mut reader =
            csv::Reader::from_path(&conf.file_location).map_err(|e| ConfigError::Invalid {
                scope: config.scope().to_string(),
                message: format!("cannot open {}: {e}", conf.file_location.display()),
            })?;
        self.headers = reader
            .headers()
            .map_err(|e| ConfigError::Invalid {
                scope: config.scope().to_string(),
                message: format!("cannot read header of {}: {e}", conf.file_location.display()),
            })?
            .iter()
            .map(str::to_string)
            .collect();

        if let Some(model_class) = &conf.model_class {
            self.constructor = Some(ctx.registry.resolve(model_class)?);
        }
        self.serialized = Arc::clone(&ctx.serialized);
        self.reader = Some(reader);
        debug!(
            file = %conf.file_location.display(),
            columns = self.headers.len(),
            "Opened CSV source"
        );
        Ok(())
    }

    async fn extract(&mut self) -> Result<Option<Payload>, ExtractError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut row = csv::StringRecord::new();
        let read = reader.read_record(&mut row);
        self.row += 1;
        match read {
            Ok(false) => {
                self.reader = None;
                Ok(None)
            }
            Ok(true) => {
                let record = self.to_record(&row);
                match self.constructor {
                    Some(constructor) => {
                        Ok(Some(Payload::Model(constructor(&record, &self.serialized)?)))
                    }
                    None => Ok(Some(Payload::Record(record))),
                }
            }
            Err(e) => match e.kind() {
                csv::ErrorKind::Io(_) => Err(ExtractError::Source {
                    source_name: self.scope().to_string(),
                    message: e.to_string(),
                }),
                _ => Err(ExtractError::Record {
                    message: format!("row {}: {e}", self.row),
                }),
            },
        }
    }
}
