use azml_recurrence::ScheduleError;
use thiserror::Error;

use crate::config::ConfigurationError;

/// Core error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Schedule description could not be compiled
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A vendor CLI command exited with a failure status
    #[error("\"{command}\" did not complete (exit status {status}): {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// A vendor CLI command produced output we could not interpret
    #[error("unexpected output from \"{command}\": {reason}")]
    UnexpectedOutput { command: String, reason: String },

    #[error("published pipeline not found for endpoint \"{endpoint}\": {reason}")]
    PublishedPipelineNotFound { endpoint: String, reason: String },

    #[error("requirements file {path} could not be read: {reason}")]
    Requirements { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for deployment operations
pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    /// Message plus any template or hint the user needs to fix the problem.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Schedule(err) => err.report(),
            other => other.to_string(),
        }
    }
}
