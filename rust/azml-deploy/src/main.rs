//! azml-deploy - Main Entry Point
//!
//! Schedules, environments and credentials for pipelines deployed to
//! Azure Machine Learning.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use azml_deploy::cli::AzCli;
use azml_deploy::config::{ConfigValidator, DeployConfig, Operation, Overrides};
use azml_deploy::credentials::{CredentialRequest, create_credential};
use azml_deploy::environment::{AzCliEnvironments, EnvironmentCreator};
use azml_deploy::logging::init_tracing;
use azml_deploy::scheduler::{AzCliScheduling, ScheduleTarget, Scheduler};
use azml_deploy::DeployResult;
use azml_recurrence::ScheduleFiles;

// Use mimalloc for better performance
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "azml-deploy")]
#[command(about = "Schedules, environments and credentials for AzureML pipelines")]
#[command(version)]
struct Args {
    /// Azure resource group of the workspace.
    #[arg(long, global = true, env = "AZML_RESOURCE_GROUP")]
    resource_group: Option<String>,

    /// AzureML workspace name.
    #[arg(long, global = true, env = "AZML_WORKSPACE")]
    workspace: Option<String>,

    /// Project name.
    #[arg(long, global = true, env = "AZML_PROJECT")]
    project: Option<String>,

    /// Kedro pipeline name.
    #[arg(long, global = true, env = "AZML_PIPELINE")]
    pipeline: Option<String>,

    /// Experiment suffix, appended to the project name.
    #[arg(long, global = true, env = "AZML_EXPERIMENT")]
    experiment: Option<String>,

    /// Project root directory.
    #[arg(long, global = true, env = "AZML_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Directory of the schedule files, relative to the project root.
    #[arg(long, global = true, env = "AZML_CONF_DIR")]
    conf_dir: Option<PathBuf>,

    /// Log level.
    #[arg(long, global = true, env = "AZML_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, global = true, env = "AZML_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the schedule files and replace the pipeline's schedules.
    Schedule {
        /// AzureML pipeline name, derived from the project when omitted.
        #[arg(long, env = "AZML_AZURE_PIPELINE")]
        azure_pipeline: Option<String>,

        /// Schedule description.
        #[arg(long, env = "AZML_DESCRIPTION")]
        description: Option<String>,
    },
    /// Compile the schedule files and print the result without deploying.
    ValidateSchedule,
    /// Reuse or register the environment for the project's requirements.
    Environment,
    /// Add an Azure Blob Gen2 credential to conf/base and conf/local.
    Credential {
        /// Credential name (can be anything you want).
        #[arg(long)]
        name: String,

        /// Datastore name to get credentials from.
        #[arg(long)]
        datastore: String,

        /// Storage account name.
        #[arg(long)]
        account: String,
    },
}

impl Args {
    fn overrides(&self) -> Overrides {
        let (azure_pipeline, description) = match &self.command {
            Command::Schedule {
                azure_pipeline,
                description,
            } => (azure_pipeline.clone(), description.clone()),
            _ => (None, None),
        };
        Overrides {
            resource_group: self.resource_group.clone(),
            workspace: self.workspace.clone(),
            project: self.project.clone(),
            pipeline: self.pipeline.clone(),
            experiment: self.experiment.clone(),
            azure_pipeline,
            description,
            project_dir: self.project_dir.clone(),
            conf_dir: self.conf_dir.clone(),
            log_level: self.log_level.clone(),
            log_json: self.log_json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    run(args).await.map_err(|e| {
        tracing::error!(error = %e, "azml-deploy failed");
        anyhow::anyhow!(e.report())
    })
}

async fn run(args: Args) -> DeployResult<()> {
    let config = DeployConfig::load()?.apply(args.overrides());
    init_tracing(&config.logging);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting azml-deploy");

    match args.command {
        Command::Schedule { .. } => {
            ConfigValidator::validate(&config, Operation::Schedule)?;
            let scheduler = Scheduler::new(
                AzCliScheduling::new(az(&config)),
                ScheduleFiles::in_dir(config.schedule_dir()),
                ScheduleTarget::from_config(&config)?,
            );
            let created = scheduler.run().await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Command::ValidateSchedule => {
            ConfigValidator::validate(&config, Operation::ValidateSchedule)?;
            let request = ScheduleFiles::in_dir(config.schedule_dir()).compile()?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Command::Environment => {
            ConfigValidator::validate(&config, Operation::Environment)?;
            let creator =
                EnvironmentCreator::from_config(AzCliEnvironments::new(az(&config)), &config)?;
            let environment = creator.run().await?;
            println!("{environment}");
        }
        Command::Credential {
            name,
            datastore,
            account,
        } => {
            ConfigValidator::validate(&config, Operation::Credential)?;
            let request = CredentialRequest {
                name,
                datastore,
                account,
            };
            for path in create_credential(&config.project_dir.join("conf"), &request)? {
                println!("Updated \"{}\"", path.display());
            }
        }
    }

    Ok(())
}

/// CLI runner for a validated configuration.
fn az(config: &DeployConfig) -> AzCli {
    AzCli::new(
        config.resource_group.clone().unwrap_or_default(),
        config.workspace.clone().unwrap_or_default(),
    )
}
