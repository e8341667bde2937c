//! Layered job configuration.
//!
//! Uses `figment` for layering: component defaults -> job file -> environment.
//! A job file is one TOML document; each component reads only its own dotted
//! scope (`extractor.csv`, `loader.filesystem_csv`, ...). Environment variables
//! use the `DATABUILDER_` prefix and `__` as the nesting separator, e.g.
//! `DATABUILDER_EXTRACTOR__CSV__FILE_LOCATION`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "DATABUILDER_";

/// The `[job]` section: which components make up the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    pub extractor: String,
    #[serde(default)]
    pub transformers: Vec<String>,
    #[serde(default = "default_loader")]
    pub loader: String,
    #[serde(default = "default_publisher")]
    pub publisher: String,
}

fn default_identifier() -> String {
    "databuilder-job".to_string()
}

fn default_loader() -> String {
    "filesystem_csv".to_string()
}

fn default_publisher() -> String {
    "noop".to_string()
}

/// The whole configuration tree of a job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    figment: Figment,
}

impl JobConfig {
    /// Load a job file and overlay `DATABUILDER_*` environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let figment = Figment::from(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Ok(Self { figment })
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self {
            figment: Figment::from(Toml::string(toml)),
        }
    }

    /// Build from any serializable tree, mostly useful in tests.
    pub fn from_value<T: Serialize>(value: T) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(value)),
        }
    }

    pub fn figment(&self) -> &Figment {
        &self.figment
    }

    /// Parse the `[job]` section.
    pub fn job(&self) -> Result<JobSpec, ConfigError> {
        self.figment
            .extract_inner("job")
            .map_err(|e| ConfigError::Invalid {
                scope: "job".into(),
                message: e.to_string(),
            })
    }

    /// View of a dotted scope, e.g. `extractor.csv`.
    pub fn scoped(&self, scope: &str) -> ScopedConfig {
        ScopedConfig {
            figment: self.figment.clone(),
            scope: scope.to_string(),
        }
    }
}

/// The part of a [`JobConfig`] owned by one component.
#[derive(Debug, Clone)]
pub struct ScopedConfig {
    figment: Figment,
    scope: String,
}

impl ScopedConfig {
    /// An empty scope; every `extract` yields the defaults.
    pub fn empty(scope: &str) -> Self {
        JobConfig::from_toml_str("").scoped(scope)
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Nested scope: `extractor.restapi` + `query` -> `extractor.restapi.query`.
    pub fn scoped(&self, sub: &str) -> ScopedConfig {
        ScopedConfig {
            figment: self.figment.clone(),
            scope: format!("{}.{sub}", self.scope),
        }
    }

    /// Another absolute scope of the same job configuration.
    pub fn with_scope(&self, scope: &str) -> ScopedConfig {
        ScopedConfig {
            figment: self.figment.clone(),
            scope: scope.to_string(),
        }
    }

    /// Whether `key` is set under this scope.
    pub fn contains(&self, key: &str) -> bool {
        self.figment.contains(&format!("{}.{key}", self.scope))
    }

    /// Resolve a component config struct: `T::default()` overridden by this scope.
    pub fn extract<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        Figment::from(Serialized::defaults(T::default()))
            .merge(self.figment.focus(&self.scope))
            .extract()
            .map_err(|e| self.invalid(e))
    }

    /// Resolve a single required value under this scope.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        if !self.contains(key) {
            return Err(ConfigError::MissingField {
                field: format!("{}.{key}", self.scope),
            });
        }
        self.figment
            .extract_inner(&format!("{}.{key}", self.scope))
            .map_err(|e| self.invalid(e))
    }

    fn invalid(&self, error: figment::Error) -> ConfigError {
        ConfigError::Invalid {
            scope: self.scope.clone(),
            message: error.to_string(),
        }
    }
}
