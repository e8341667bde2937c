//! Turns Neo4j bulk-load CSV files into an idempotent Cypher script.
//!
//! Every node is `MERGE`d on its `key` under a per-label uniqueness constraint
//! and every relationship is merged in both directions, so replaying the
//! script against a populated graph converges to the same state. Each node and
//! relationship carries the run's `published_tag`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, PublishError};
use crate::graph::UNQUOTED_SUFFIX;
use crate::pipeline::{PublishReport, Publisher};
use crate::serializers::neo4j::{
    NODE_KEY, NODE_LABEL, RELATION_END_KEY, RELATION_END_LABEL, RELATION_REVERSE_TYPE,
    RELATION_START_KEY, RELATION_START_LABEL, RELATION_TYPE,
};

const RELATION_COLUMNS: [&str; 6] = [
    RELATION_START_LABEL,
    RELATION_END_LABEL,
    RELATION_START_KEY,
    RELATION_END_KEY,
    RELATION_TYPE,
    RELATION_REVERSE_TYPE,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CypherScriptPublisherConfig {
    pub node_files_directory: PathBuf,
    pub relation_files_directory: PathBuf,
    /// Where the script is written.
    pub output_path: PathBuf,
    /// Defaults to the run id.
    pub published_tag: Option<String>,
}

#[derive(Debug, Default)]
pub struct CypherScriptPublisher {
    config: CypherScriptPublisherConfig,
    published_tag: String,
}

impl CypherScriptPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_statements(
        &self,
        path: &Path,
        labels: &mut BTreeSet<String>,
        out: &mut String,
    ) -> Result<usize, PublishError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let label_idx = column(&headers, NODE_LABEL, path)?;
        let key_idx = column(&headers, NODE_KEY, path)?;

        let mut count = 0;
        for row in reader.records() {
            let row = row?;
            let label = &row[label_idx];
            labels.insert(label.to_string());

            let mut sets = properties("n", &headers, &row, &[label_idx, key_idx], path)?;
            sets.push(format!("n.published_tag = {}", quote(&self.published_tag)));
            out.push_str(&format!(
                "MERGE (n:{} {{key: {}}}) SET {};\n",
                identifier(label),
                quote(&row[key_idx]),
                sets.join(", ")
            ));
            count += 1;
        }
        Ok(count)
    }

    fn relation_statements(&self, path: &Path, out: &mut String) -> Result<usize, PublishError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let idx = RELATION_COLUMNS
            .iter()
            .map(|name| column(&headers, name, path))
            .collect::<Result<Vec<_>, _>>()?;
        let (start_label, end_label, start_key, end_key, rel_type, reverse_type) =
            (idx[0], idx[1], idx[2], idx[3], idx[4], idx[5]);

        let mut count = 0;
        for row in reader.records() {
            let row = row?;
            let tag = quote(&self.published_tag);
            let mut sets = Vec::new();
            for alias in ["r1", "r2"] {
                sets.extend(properties(alias, &headers, &row, &idx, path)?);
                sets.push(format!("{alias}.published_tag = {tag}"));
            }
            out.push_str(&format!(
                "MATCH (n1:{} {{key: {}}}), (n2:{} {{key: {}}}) \
                 MERGE (n1)-[r1:{}]->(n2)-[r2:{}]->(n1) SET {};\n",
                identifier(&row[start_label]),
                quote(&row[start_key]),
                identifier(&row[end_label]),
                quote(&row[end_key]),
                identifier(&row[rel_type]),
                identifier(&row[reverse_type]),
                sets.join(", ")
            ));
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl Publisher for CypherScriptPublisher {
    fn scope(&self) -> &str {
        "publisher.cypher"
    }

    fn init(&mut self, config: &ScopedConfig, ctx: &RunContext) -> Result<(), ConfigError> {
        let conf: CypherScriptPublisherConfig = config.extract()?;
        for (name, value) in [
            ("node_files_directory", &conf.node_files_directory),
            ("relation_files_directory", &conf.relation_files_directory),
            ("output_path", &conf.output_path),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: format!("{}.{name}", config.scope()),
                });
            }
        }
        self.published_tag = conf
            .published_tag
            .clone()
            .unwrap_or_else(|| ctx.run_id.to_string());
        self.config = conf;
        Ok(())
    }

    async fn publish(&mut self) -> Result<PublishReport, PublishError> {
        let node_files = csv_files(&self.config.node_files_directory)?;
        let relation_files = csv_files(&self.config.relation_files_directory)?;

        let mut labels = BTreeSet::new();
        let mut nodes_script = String::new();
        let mut relations_script = String::new();
        let mut report = PublishReport {
            files: node_files.len() + relation_files.len(),
            output: Some(self.config.output_path.clone()),
            ..Default::default()
        };

        for path in &node_files {
            report.nodes += self.node_statements(path, &mut labels, &mut nodes_script)?;
            debug!(file = %path.display(), "Published node file");
        }
        for path in &relation_files {
            report.relations += self.relation_statements(path, &mut relations_script)?;
            debug!(file = %path.display(), "Published relation file");
        }

        let mut script = String::new();
        for label in &labels {
            script.push_str(&format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{}) REQUIRE n.key IS UNIQUE;\n",
                identifier(label)
            ));
        }
        script.push_str(&nodes_script);
        script.push_str(&relations_script);

        if let Some(parent) = self.config.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.config.output_path, script).await?;

        info!(
            output = %self.config.output_path.display(),
            nodes = report.nodes,
            relations = report.relations,
            published_tag = %self.published_tag,
            "Cypher script written"
        );
        Ok(report)
    }
}

/// `*.csv` files of a directory, sorted by name. A missing directory has none.
fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn column(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize, PublishError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PublishError::MissingColumn {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
}

/// `alias.name = value` for every non-reserved column.
///
/// `:UNQUOTED` columns are written bare and must hold a number or a boolean.
fn properties(
    alias: &str,
    headers: &csv::StringRecord,
    row: &csv::StringRecord,
    reserved: &[usize],
    path: &Path,
) -> Result<Vec<String>, PublishError> {
    let mut sets = Vec::new();
    for (idx, (name, value)) in headers.iter().zip(row.iter()).enumerate() {
        if reserved.contains(&idx) {
            continue;
        }
        match name.strip_suffix(UNQUOTED_SUFFIX) {
            Some(_) if value.is_empty() => {}
            Some(bare) if is_literal(value) => {
                sets.push(format!("{alias}.{} = {}", identifier(bare), value.trim()));
            }
            Some(_) => {
                return Err(PublishError::InvalidUnquotedValue {
                    column: name.to_string(),
                    value: value.to_string(),
                    path: path.to_path_buf(),
                });
            }
            None => sets.push(format!("{alias}.{} = {}", identifier(name), quote(value))),
        }
    }
    Ok(sets)
}

/// A finite number or a boolean.
fn is_literal(value: &str) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return true;
    }
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Cypher string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Label, type or property name, backtick-quoted when needed.
fn identifier(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::loader::FsGraphCsvLoader;
    use crate::models::{Model, TableColumnStats};
    use crate::pipeline::Loader;
    use crate::types::Payload;
    use serde_json::json;

    fn load_stats(root: &Path, stat_val: &str) {
        let config = JobConfig::from_value(json!({
            "loader": {"filesystem_csv": {
                "node_dir_path": root.join("nodes"),
                "relationship_dir_path": root.join("relationships"),
            }}
        }));
        let mut loader = FsGraphCsvLoader::new();
        loader
            .init(
                &config.scoped("loader.filesystem_csv"),
                &RunContext::default(),
            )
            .unwrap();
        let record = json!({
            "table_name": "core.users",
            "col_name": "id",
            "stat_name": "distinct",
            "stat_val": stat_val,
            "start_epoch": "1",
            "end_epoch": "2",
        });
        let model = TableColumnStats::from_record(
            record.as_object().unwrap(),
            &crate::context::SerializedKeys::new(),
        )
        .unwrap();
        assert!(matches!(model, Model::TableColumnStats(_)));
        loader.load(Payload::Model(model)).unwrap();
        loader.close().unwrap();
    }

    fn publisher(root: &Path, tag: Option<&str>) -> CypherScriptPublisher {
        let config = JobConfig::from_value(json!({
            "publisher": {"cypher": {
                "node_files_directory": root.join("nodes"),
                "relation_files_directory": root.join("relationships"),
                "output_path": root.join("out/publish.cypher"),
                "published_tag": tag,
            }}
        }));
        let mut publisher = CypherScriptPublisher::new();
        publisher
            .init(&config.scoped("publisher.cypher"), &RunContext::default())
            .unwrap();
        publisher
    }

    #[tokio::test]
    async fn test_script_from_loader_output() {
        let dir = tempfile::tempdir().unwrap();
        load_stats(dir.path(), "12");

        let report = publisher(dir.path(), Some("2020-01-01"))
            .publish()
            .await
            .unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.nodes, 1);
        assert_eq!(report.relations, 1);

        let script = fs::read_to_string(dir.path().join("out/publish.cypher")).unwrap();
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines[0],
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Stat) REQUIRE n.key IS UNIQUE;"
        );
        assert_eq!(
            lines[1],
            "MERGE (n:Stat {key: 'hive://gold.core/users/id/distinct/'}) SET \
             n.end_epoch = '2', n.start_epoch = '1', n.stat_name = 'distinct', \
             n.stat_val = 12, n.published_tag = '2020-01-01';"
        );
        assert!(lines[2].starts_with(
            "MATCH (n1:Stat {key: 'hive://gold.core/users/id/distinct/'}), \
             (n2:Column {key: 'hive://gold.core/users/id'}) \
             MERGE (n1)-[r1:STAT_OF]->(n2)-[r2:STAT]->(n1) SET"
        ));
        assert!(lines[2].ends_with("r2.published_tag = '2020-01-01';"));
    }

    #[tokio::test]
    async fn test_missing_reserved_column() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nodes")).unwrap();
        fs::write(dir.path().join("nodes/Bad_0.csv"), "\"~id\",\"~label\"\n\"a\",\"Bad\"\n")
            .unwrap();

        let err = publisher(dir.path(), None).publish().await.unwrap_err();
        assert!(matches!(err, PublishError::MissingColumn { ref column, .. } if column == "LABEL"));
    }

    #[tokio::test]
    async fn test_unquoted_value_must_be_literal() {
        let dir = tempfile::tempdir().unwrap();
        load_stats(dir.path(), "1; MATCH (x) DETACH DELETE x");

        let err = publisher(dir.path(), None).publish().await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidUnquotedValue { ref column, ref value, .. }
                if column == "stat_val:UNQUOTED" && value.starts_with("1; MATCH")
        ));
        assert!(!dir.path().join("out/publish.cypher").exists());
    }

    #[test]
    fn test_literal_detection() {
        for ok in ["12", "-3", "0.25", "1e6", "true", "FALSE", " 7 "] {
            assert!(is_literal(ok), "{ok}");
        }
        for bad in ["", "abc", "NaN", "inf", "1 OR 1=1", "1; x", "-", "."] {
            assert!(!is_literal(bad), "{bad}");
        }
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
        assert_eq!(identifier("Dashboardgroup"), "Dashboardgroup");
        assert_eq!(identifier("odd name"), "`odd name`");
    }

    #[test]
    fn test_tag_defaults_to_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = publisher(dir.path(), None);
        assert!(uuid::Uuid::parse_str(&publisher.published_tag).is_ok());
    }
}
