//! Configuration management for azml-deploy.
//!
//! Settings come from, in increasing priority:
//! 1. Default values
//! 2. An optional `config/azml-deploy.{yaml,toml,json}` file
//! 3. `AZML_*` environment variables (a `.env` file is honoured)
//! 4. Command-line flags, applied through [`DeployConfig::apply`]
//!
//! # Validation
//!
//! ```rust,ignore
//! use azml_deploy::config::{ConfigValidator, DeployConfig, Operation};
//!
//! let config = DeployConfig::load()?;
//! ConfigValidator::validate(&config, Operation::Schedule)?;
//! ```

pub mod error;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use validator::{ConfigValidator, Operation};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming;

/// Kedro pipeline name used when none is given.
pub const DEFAULT_PIPELINE: &str = "__default__";

/// Deployment configuration shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Azure resource group holding the workspace.
    #[serde(default)]
    pub resource_group: Option<String>,
    /// AzureML workspace name.
    #[serde(default)]
    pub workspace: Option<String>,
    /// Project name, the root of every derived name.
    #[serde(default)]
    pub project: Option<String>,
    /// `major.minor` python version for environments.
    #[serde(default = "default_python")]
    pub python: String,
    /// Kedro pipeline name.
    #[serde(default = "default_pipeline")]
    pub pipeline: String,
    /// Experiment suffix appended to the project name. Empty means none.
    #[serde(default)]
    pub experiment: String,
    /// Explicit AzureML pipeline name, derived when absent.
    #[serde(default)]
    pub azure_pipeline: Option<String>,
    /// Schedule description shown in the workspace.
    #[serde(default)]
    pub description: String,
    /// Project root directory.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// Directory holding the schedule files, relative to the project root.
    #[serde(default = "default_conf_dir")]
    pub conf_dir: PathBuf,
    /// Seconds to wait for schedule provisioning.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_python() -> String {
    "3.8".to_string()
}

fn default_pipeline() -> String {
    DEFAULT_PIPELINE.to_string()
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_conf_dir() -> PathBuf {
    PathBuf::from(azml_recurrence::DEFAULT_CONF_DIR)
}

fn default_wait_timeout() -> u64 {
    3600
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            resource_group: None,
            workspace: None,
            project: None,
            python: default_python(),
            pipeline: default_pipeline(),
            experiment: String::new(),
            azure_pipeline: None,
            description: String::new(),
            project_dir: default_project_dir(),
            conf_dir: default_conf_dir(),
            wait_timeout_secs: default_wait_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values given on the command line. `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub resource_group: Option<String>,
    pub workspace: Option<String>,
    pub project: Option<String>,
    pub pipeline: Option<String>,
    pub experiment: Option<String>,
    pub azure_pipeline: Option<String>,
    pub description: Option<String>,
    pub project_dir: Option<PathBuf>,
    pub conf_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_json: bool,
}

impl DeployConfig {
    /// Load configuration from defaults, the optional config file and the
    /// environment.
    pub fn load() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new("config/azml-deploy"))
    }

    /// Load configuration using `file` (without extension) as the optional
    /// config file.
    pub fn load_from(file: &Path) -> ConfigResult<Self> {
        let config = config::Config::builder()
            .set_default("python", default_python())?
            .set_default("pipeline", DEFAULT_PIPELINE)?
            .set_default("conf_dir", azml_recurrence::DEFAULT_CONF_DIR)?
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("AZML")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: DeployConfig = config.try_deserialize()?;
        tracing::debug!(
            project = ?loaded.project,
            pipeline = %loaded.pipeline,
            "Configuration loaded"
        );
        Ok(loaded)
    }

    /// Apply command-line values on top of the loaded configuration.
    #[must_use]
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.resource_group.is_some() {
            self.resource_group = overrides.resource_group;
        }
        if overrides.workspace.is_some() {
            self.workspace = overrides.workspace;
        }
        if overrides.project.is_some() {
            self.project = overrides.project;
        }
        if let Some(pipeline) = overrides.pipeline {
            self.pipeline = pipeline;
        }
        if let Some(experiment) = overrides.experiment {
            self.experiment = experiment;
        }
        if overrides.azure_pipeline.is_some() {
            self.azure_pipeline = overrides.azure_pipeline;
        }
        if let Some(description) = overrides.description {
            self.description = description;
        }
        if let Some(dir) = overrides.project_dir {
            self.project_dir = dir;
        }
        if let Some(dir) = overrides.conf_dir {
            self.conf_dir = dir;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self.logging.json |= overrides.log_json;
        self
    }

    /// Project name, or a [`ConfigurationError::MissingRequired`].
    pub fn project_name(&self) -> ConfigResult<&str> {
        self.project.as_deref().ok_or_else(|| {
            ConfigurationError::missing_required(
                "project",
                "Naming the experiment, pipeline and environment",
                "--project or AZML_PROJECT",
            )
        })
    }

    /// Experiment name derived from the project and the suffix.
    pub fn experiment_name(&self) -> ConfigResult<String> {
        Ok(naming::experiment_name(self.project_name()?, &self.experiment))
    }

    /// AzureML pipeline name, explicit or derived.
    pub fn azure_pipeline_name(&self) -> ConfigResult<String> {
        if let Some(name) = &self.azure_pipeline {
            return Ok(name.clone());
        }
        let project = self.project_name()?;
        Ok(naming::azure_pipeline_name(
            project,
            &self.pipeline,
            &self.experiment_name()?,
        ))
    }

    /// Absolute-or-relative directory of the schedule files.
    #[must_use]
    pub fn schedule_dir(&self) -> PathBuf {
        self.project_dir.join(&self.conf_dir)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to use JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> DeployConfig {
        DeployConfig {
            project: Some("sales".into()),
            ..DeployConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.pipeline, "__default__");
        assert_eq!(config.python, "3.8");
        assert_eq!(config.conf_dir, PathBuf::from("conf/base"));
        assert_eq!(config.wait_timeout_secs, 3600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_derived_names() {
        let mut config = configured();
        assert_eq!(config.experiment_name().unwrap(), "sales");
        assert_eq!(config.azure_pipeline_name().unwrap(), "sales_default");

        config.experiment = "nightly".into();
        config.pipeline = "train".into();
        assert_eq!(config.experiment_name().unwrap(), "sales_nightly");
        assert_eq!(config.azure_pipeline_name().unwrap(), "sales_train_nightly");

        config.azure_pipeline = Some("custom".into());
        assert_eq!(config.azure_pipeline_name().unwrap(), "custom");
    }

    #[test]
    fn test_missing_project() {
        let err = DeployConfig::default().experiment_name().unwrap_err();
        assert!(err.to_string().contains("AZML_PROJECT"));
    }

    #[test]
    fn test_apply_overrides() {
        let config = configured().apply(Overrides {
            workspace: Some("ws".into()),
            pipeline: Some("score".into()),
            log_json: true,
            ..Overrides::default()
        });
        assert_eq!(config.workspace.as_deref(), Some("ws"));
        assert_eq!(config.project.as_deref(), Some("sales"));
        assert_eq!(config.pipeline, "score");
        assert!(config.logging.json);
    }

    #[test]
    fn test_schedule_dir() {
        let config = DeployConfig {
            project_dir: PathBuf::from("/work/sales"),
            ..DeployConfig::default()
        };
        assert_eq!(config.schedule_dir(), PathBuf::from("/work/sales/conf/base"));
    }
}
