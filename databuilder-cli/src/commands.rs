//! CLI subcommand handlers.

use anyhow::Context;
use databuilder_core::config::JobConfig;
use databuilder_core::error::ConfigError;
use databuilder_core::extractor::CsvExtractor;
use databuilder_core::loader::FsGraphCsvLoader;
use databuilder_core::models::ModelRegistry;
use databuilder_core::pipeline::{
    DefaultJob, DefaultTask, Extractor, JobReport, Loader, Publisher, Transformer,
};
use databuilder_core::publisher::{CypherScriptPublisher, NoopPublisher};
use databuilder_core::transformer::{
    ChainedTransformer, DictToModel, TemplateVariableSubstitution, TimestampStringToEpoch,
};
use databuilder_rest::RestApiExtractor;
use std::path::Path;
use tracing::info;

use crate::Commands;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { job, identifier } => {
            let report = run_job(&job, identifier).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Models => {
            for name in ModelRegistry::with_builtins().names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn run_job(path: &Path, identifier: Option<String>) -> anyhow::Result<JobReport> {
    let config = JobConfig::load(path)
        .with_context(|| format!("Failed to load job file {}", path.display()))?;
    let mut job = build_job(config)?;
    if let Some(identifier) = identifier {
        job = job.with_identifier(identifier);
    }

    let report = job.launch().await.context("Job failed")?;
    info!(run_id = %report.run_id, "Done");
    Ok(report)
}

/// Assemble the components named in `[job]`.
pub(crate) fn build_job(config: JobConfig) -> Result<DefaultJob, ConfigError> {
    let components = config.job()?;

    let mut task = DefaultTask::new(
        extractor(&components.extractor)?,
        loader(&components.loader)?,
    );
    match components.transformers.as_slice() {
        [] => {}
        [single] => task = task.with_transformer(transformer(single)?),
        many => {
            let members = many
                .iter()
                .map(|name| transformer(name))
                .collect::<Result<Vec<_>, _>>()?;
            task = task.with_transformer(Box::new(ChainedTransformer::new(members)));
        }
    }

    let publisher = publisher(&components.publisher)?;
    Ok(DefaultJob::new(config, task, publisher).with_identifier(components.identifier))
}

fn unknown(kind: &str, name: &str) -> ConfigError {
    ConfigError::UnknownComponent {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

fn extractor(name: &str) -> Result<Box<dyn Extractor>, ConfigError> {
    match name {
        "csv" => Ok(Box::new(CsvExtractor::new())),
        "restapi" => Ok(Box::new(RestApiExtractor::new())),
        other => Err(unknown("extractor", other)),
    }
}

fn transformer(name: &str) -> Result<Box<dyn Transformer>, ConfigError> {
    match name {
        "dict_to_model" => Ok(Box::new(DictToModel::new())),
        "template_variable_substitution" => Ok(Box::new(TemplateVariableSubstitution::new())),
        "timestamp_str_to_epoch" => Ok(Box::new(TimestampStringToEpoch::new())),
        other => Err(unknown("transformer", other)),
    }
}

fn loader(name: &str) -> Result<Box<dyn Loader>, ConfigError> {
    match name {
        "filesystem_csv" => Ok(Box::new(FsGraphCsvLoader::new())),
        other => Err(unknown("loader", other)),
    }
}

fn publisher(name: &str) -> Result<Box<dyn Publisher>, ConfigError> {
    match name {
        "noop" => Ok(Box::new(NoopPublisher::new())),
        "cypher" => Ok(Box::new(CypherScriptPublisher::new())),
        other => Err(unknown("publisher", other)),
    }
}
