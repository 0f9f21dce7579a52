//! AzureML environments built from the project's `requirements.txt`.
//!
//! An environment already registered under the project or experiment name
//! is reused when its pip packages match the local requirements exactly.
//! Otherwise the conda file, Dockerfile and environment definition are
//! staged in `environment/`, registered, and the staging directory removed.

pub mod requirements;

pub use requirements::{Requirement, parse_requirements, read_requirements};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::cli::AzCli;
use crate::config::{ConfigResult, DeployConfig};
use crate::error::{DeployError, DeployResult};

pub const ENVIRONMENT_DIR: &str = "environment";
pub const REQUIREMENTS_FILENAME: &str = "requirements.txt";
pub const CONDA_FILENAME: &str = "conda_dependencies.yml";
pub const DOCKERFILE_FILENAME: &str = "BaseDockerfile";
pub const AZUREML_ENVIRONMENT_FILENAME: &str = "azureml_environment.json";

pub const BASE_IMAGE: &str = "mcr.microsoft.com/azureml/openmpi4.1.0-ubuntu20.04:20220516.v1";
const CONDA_CHANNEL: &str = "conda-forge";

/// Registered environments in the workspace.
#[async_trait]
pub trait EnvironmentRegistry: Send + Sync {
    /// Pip packages of the environment called `name`, `None` when there is
    /// no such environment.
    async fn pip_packages(&self, name: &str) -> DeployResult<Option<Vec<String>>>;

    /// Register the environment definition staged in `directory`.
    async fn register(&self, directory: &Path) -> DeployResult<()>;
}

/// The environment to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSpec {
    pub name: String,
    /// `major.minor` python version.
    pub python: String,
    pub requirements: Vec<Requirement>,
    /// Build the Spark flavoured image.
    pub spark: bool,
}

#[derive(Serialize)]
struct CondaFile<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    dependencies: Vec<CondaDependency>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CondaDependency {
    Package(String),
    Pip { pip: Vec<String> },
}

impl EnvironmentSpec {
    /// Requirement lines as written in `requirements.txt`.
    #[must_use]
    pub fn requirement_lines(&self) -> Vec<String> {
        self.requirements.iter().map(|r| r.line.clone()).collect()
    }

    /// Whether a registered package list matches the local requirements.
    #[must_use]
    pub fn matches(&self, packages: &[String]) -> bool {
        let local: HashSet<&str> = self.requirements.iter().map(|r| r.line.as_str()).collect();
        let remote: HashSet<&str> = packages.iter().map(String::as_str).collect();
        local == remote
    }

    pub fn conda_dependencies(&self) -> DeployResult<String> {
        let file = CondaFile {
            name: &self.name,
            channels: [CONDA_CHANNEL],
            dependencies: vec![
                CondaDependency::Package(format!("python={}", self.python)),
                CondaDependency::Package("pip".to_string()),
                CondaDependency::Pip {
                    pip: self.requirement_lines(),
                },
            ],
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    #[must_use]
    pub fn dockerfile(&self) -> String {
        let mut lines = vec![format!("FROM {BASE_IMAGE}")];
        if self.spark {
            lines.extend(
                [
                    "USER root:root",
                    "RUN mkdir -p /usr/share/man/man1/",
                    "RUN apt-get update && apt-get install -y openjdk-8-jre",
                    "RUN pip install databricks-connect==9.1.21",
                    "RUN pip install azure-cli && az extension add --name azure-cli-ml",
                    "RUN export JAVA_HOME=/usr/lib/jvm/java-8-openjdk-amd64/jre/bin/java",
                ]
                .map(String::from),
            );
        }
        let mut dockerfile = lines.join("\n");
        dockerfile.push('\n');
        dockerfile
    }

    pub fn azureml_environment(&self) -> DeployResult<String> {
        let definition = serde_json::json!({ "name": self.name, "python": {} });
        Ok(serde_json::to_string_pretty(&definition)?)
    }

    /// Write the three environment files into `directory`.
    pub async fn write_to(&self, directory: &Path) -> DeployResult<()> {
        tokio::fs::create_dir_all(directory).await?;
        tokio::fs::write(directory.join(CONDA_FILENAME), self.conda_dependencies()?).await?;
        tokio::fs::write(directory.join(DOCKERFILE_FILENAME), self.dockerfile()).await?;
        tokio::fs::write(
            directory.join(AZUREML_ENVIRONMENT_FILENAME),
            self.azureml_environment()?,
        )
        .await?;
        Ok(())
    }
}

/// Finds or registers the environment a project runs in.
#[derive(Debug)]
pub struct EnvironmentCreator<R> {
    registry: R,
    project_dir: PathBuf,
    project: String,
    experiment: String,
    python: String,
}

impl<R: EnvironmentRegistry> EnvironmentCreator<R> {
    #[must_use]
    pub fn new(
        registry: R,
        project_dir: impl Into<PathBuf>,
        project: impl Into<String>,
        experiment: impl Into<String>,
        python: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            project_dir: project_dir.into(),
            project: project.into(),
            experiment: experiment.into(),
            python: python.into(),
        }
    }

    pub fn from_config(registry: R, config: &DeployConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            registry,
            config.project_dir.clone(),
            config.project_name()?,
            config.experiment_name()?,
            config.python.clone(),
        ))
    }

    fn requirements_path(&self) -> PathBuf {
        self.project_dir.join("src").join(REQUIREMENTS_FILENAME)
    }

    fn uses_spark(&self) -> bool {
        self.project_dir
            .join("src/conf/base/spark.yml")
            .exists()
    }

    fn staging_dir(&self) -> PathBuf {
        self.project_dir.join(ENVIRONMENT_DIR)
    }

    /// The environment to register, named after the experiment.
    pub fn spec(&self) -> DeployResult<EnvironmentSpec> {
        Ok(EnvironmentSpec {
            name: self.experiment.clone(),
            python: self.python.clone(),
            requirements: read_requirements(&self.requirements_path())?,
            spark: self.uses_spark(),
        })
    }

    /// Name of a registered environment with the same requirements,
    /// checking the project name before the experiment name.
    pub async fn find_environment(&self, spec: &EnvironmentSpec) -> DeployResult<Option<String>> {
        let mut candidates = vec![self.project.as_str()];
        if self.experiment != self.project {
            candidates.push(self.experiment.as_str());
        }

        for name in candidates {
            if let Some(packages) = self.registry.pip_packages(name).await? {
                if spec.matches(&packages) {
                    return Ok(Some(name.to_string()));
                }
                tracing::debug!(environment = %name, "Registered requirements differ");
            }
        }
        Ok(None)
    }

    /// Return the environment name to run in, registering one when needed.
    pub async fn run(&self) -> DeployResult<String> {
        let spec = self.spec()?;

        if let Some(existing) = self.find_environment(&spec).await? {
            tracing::info!(
                environment = %existing,
                "Environment with the same requirements already exists, using it"
            );
            return Ok(existing);
        }

        tracing::info!(
            environment = %spec.name,
            "No environment with the same requirements found, creating or updating it"
        );
        let staging = self.staging_dir();
        if staging.exists() {
            return Err(DeployError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", staging.display()),
            )));
        }

        let registered = match spec.write_to(&staging).await {
            Ok(()) => self.registry.register(&staging).await,
            Err(e) => Err(e),
        };
        let cleanup = tokio::fs::remove_dir_all(&staging).await;
        if let Err(e) = registered {
            if let Err(cleanup) = cleanup {
                tracing::warn!(
                    path = %staging.display(),
                    error = %cleanup,
                    "Failed to remove environment staging directory"
                );
            }
            return Err(e);
        }
        cleanup?;

        Ok(spec.name)
    }
}

/// Environment registry backed by `az ml environment`.
#[derive(Debug, Clone)]
pub struct AzCliEnvironments {
    az: AzCli,
}

impl AzCliEnvironments {
    #[must_use]
    pub fn new(az: AzCli) -> Self {
        Self { az }
    }
}

/// Pip packages listed in an `az ml environment show` document.
#[must_use]
pub fn pip_packages_from(environment: &serde_json::Value) -> Vec<String> {
    let python = &environment["python"];
    let conda = if python["condaDependencies"].is_null() {
        &python["conda_dependencies"]
    } else {
        &python["condaDependencies"]
    };

    conda["dependencies"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|dependency| dependency["pip"].as_array())
        .flatten()
        .filter_map(|package| package.as_str().map(str::to_string))
        .collect()
}

#[async_trait]
impl EnvironmentRegistry for AzCliEnvironments {
    async fn pip_packages(&self, name: &str) -> DeployResult<Option<Vec<String>>> {
        match self
            .az
            .run_json::<serde_json::Value>(&["environment", "show", "--name", name])
            .await
        {
            Ok(environment) => Ok(Some(pip_packages_from(&environment))),
            Err(DeployError::CommandFailed { .. }) => {
                tracing::debug!(environment = %name, "Environment not registered");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn register(&self, directory: &Path) -> DeployResult<()> {
        let directory = directory.to_string_lossy();
        self.az
            .run(&["environment", "register", "--directory", &directory])
            .await?;
        Ok(())
    }
}
