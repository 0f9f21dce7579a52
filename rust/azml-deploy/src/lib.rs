//! Deployment tooling for data pipelines on Azure Machine Learning.
//!
//! - [`scheduler`]: compile the project's schedule files and replace the
//!   published pipeline's schedules.
//! - [`environment`]: reuse or register the environment the pipeline runs in.
//! - [`credentials`]: add storage credentials to the project configuration.
//!
//! Workspace access goes through the [`scheduler::SchedulingService`] and
//! [`environment::EnvironmentRegistry`] traits. [`cli::AzCli`] backs both
//! with the `az ml` command line.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod logging;
pub mod naming;
pub mod scheduler;

pub use error::{DeployError, DeployResult};
