//! Writes models as graph bulk-load CSV files on the local filesystem.
//!
//! Node rows are grouped into one file per label and header shape,
//! relationship rows into one file per `{start}_{end}_{type}` and header
//! shape. Non-numeric fields are quoted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, LoadError};
use crate::graph::{GraphNode, GraphRelationship, GraphSerializable};
use crate::pipeline::Loader;
use crate::serializers::{GraphFormat, Row, header, neo4j, neptune};
use crate::template::value_to_string;
use crate::types::Payload;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FsGraphCsvLoaderConfig {
    pub node_dir_path: PathBuf,
    pub relationship_dir_path: PathBuf,
    pub format: GraphFormat,
    /// Wipe output directories that already hold files instead of failing.
    pub force_create_directory: bool,
}

#[derive(Default)]
pub struct FsGraphCsvLoader {
    config: FsGraphCsvLoaderConfig,
    writers: HashMap<(String, Vec<String>), csv::Writer<File>>,
    files_per_stem: HashMap<String, usize>,
    nodes: usize,
    relations: usize,
}

impl FsGraphCsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes and relationship rows written so far.
    pub fn written(&self) -> (usize, usize) {
        (self.nodes, self.relations)
    }

    fn write_node(&mut self, node: &GraphNode) -> Result<(), LoadError> {
        let row = match self.config.format {
            GraphFormat::Neo4j => neo4j::serialize_node(node),
            GraphFormat::Neptune => neptune::convert_node(node),
        };
        let dir = self.config.node_dir_path.clone();
        self.write_row(&dir, node.label.clone(), &row)?;
        self.nodes += 1;
        Ok(())
    }

    fn write_relation(&mut self, relation: &GraphRelationship) -> Result<(), LoadError> {
        let stem = format!(
            "{}_{}_{}",
            relation.start_label, relation.end_label, relation.relationship_type
        );
        let dir = self.config.relationship_dir_path.clone();
        match self.config.format {
            GraphFormat::Neo4j => {
                self.write_row(&dir, stem, &neo4j::serialize_relationship(relation))?;
            }
            GraphFormat::Neptune => {
                for row in neptune::convert_relationship(relation) {
                    self.write_row(&dir, stem.clone(), &row)?;
                }
            }
        }
        self.relations += 1;
        Ok(())
    }

    fn write_row(&mut self, dir: &Path, stem: String, row: &Row) -> Result<(), LoadError> {
        let key = (stem, header(row));
        if !self.writers.contains_key(&key) {
            let count = self.files_per_stem.entry(key.0.clone()).or_insert(0);
            let path = dir.join(format!("{}_{count}.csv", key.0));
            *count += 1;

            let mut writer = csv::WriterBuilder::new()
                .quote_style(csv::QuoteStyle::NonNumeric)
                .from_path(&path)?;
            writer.write_record(&key.1)?;
            debug!(path = %path.display(), "Created CSV file");
            self.writers.insert(key.clone(), writer);
        }

        if let Some(writer) = self.writers.get_mut(&key) {
            writer.write_record(row.iter().map(|(_, value)| value_to_string(value)))?;
        }
        Ok(())
    }
}

/// Make sure `dir` exists and holds no earlier output.
fn prepare_directory(dir: &Path, force: bool, scope: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        scope: scope.to_string(),
        message,
    };

    if dir.exists() {
        let occupied = fs::read_dir(dir)
            .map_err(|e| invalid(format!("cannot read {}: {e}", dir.display())))?
            .next()
            .is_some();
        if occupied {
            if !force {
                return Err(invalid(format!(
                    "{} is not empty; set force_create_directory to overwrite it",
                    dir.display()
                )));
            }
            fs::remove_dir_all(dir)
                .map_err(|e| invalid(format!("cannot clear {}: {e}", dir.display())))?;
        }
    }
    fs::create_dir_all(dir).map_err(|e| invalid(format!("cannot create {}: {e}", dir.display())))
}

impl Loader for FsGraphCsvLoader {
    fn scope(&self) -> &str {
        "loader.filesystem_csv"
    }

    fn init(&mut self, config: &ScopedConfig, _ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: FsGraphCsvLoaderConfig = config.extract()?;
        for (name, dir) in [
            ("node_dir_path", &conf.node_dir_path),
            ("relationship_dir_path", &conf.relationship_dir_path),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.{name}", config.scope()),
                });
            }
        }

        prepare_directory(&conf.node_dir_path, conf.force_create_directory, config.scope())?;
        if conf.relationship_dir_path != conf.node_dir_path {
            prepare_directory(
                &conf.relationship_dir_path,
                conf.force_create_directory,
                config.scope(),
            )?;
        }
        self.config = conf;
        Ok(())
    }

    fn load(&mut self, payload: Payload) -> Result<(), LoadError> {
        let mut model = match payload {
            Payload::Model(model) => model,
            other => {
                return Err(LoadError::UnsupportedPayload {
                    scope: self.scope().to_string(),
                    payload: other.kind().to_string(),
                });
            }
        };

        while let Some(node) = model.next_node()? {
            self.write_node(&node)?;
        }
        while let Some(relation) = model.next_relation()? {
            self.write_relation(&relation)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), LoadError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        info!(
            files = self.writers.len(),
            nodes = self.nodes,
            relations = self.relations,
            format = %self.config.format,
            "Graph CSV files written"
        );
        Ok(())
    }
}
