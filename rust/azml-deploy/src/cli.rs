//! Runner for `az ml` commands.
//!
//! Every command is scoped to one resource group and workspace. Commands
//! run sequentially on the tokio runtime; no retries are attempted.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tokio::process::Command;

use crate::error::{DeployError, DeployResult};
use crate::logging::OpTimer;

/// Start of a JSON document inside CLI output that may carry warnings first.
static JSON_START: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[\r?\n|\{\r?\n").ok());

/// Handle on the `az` executable bound to one AzureML workspace.
#[derive(Debug, Clone)]
pub struct AzCli {
    resource_group: String,
    workspace: String,
    program: PathBuf,
}

impl AzCli {
    /// Create a runner that calls `az` from `PATH`.
    pub fn new(resource_group: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            workspace: workspace.into(),
            program: PathBuf::from("az"),
        }
    }

    /// Use a different executable in place of `az`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn arguments(&self, args: &[&str]) -> Vec<OsString> {
        let mut all: Vec<OsString> = Vec::with_capacity(args.len() + 5);
        all.push("ml".into());
        all.extend(args.iter().map(OsString::from));
        all.push("--resource-group".into());
        all.push(self.resource_group.clone().into());
        all.push("--workspace".into());
        all.push(self.workspace.clone().into());
        all
    }

    /// Human-readable command line, as used in logs and errors.
    #[must_use]
    pub fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.arguments(args) {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run `az ml <args>` and return its standard output.
    pub async fn run(&self, args: &[&str]) -> DeployResult<String> {
        let command = self.command_line(args);
        let timer = OpTimer::new("az", args.first().copied().unwrap_or("ml"));
        tracing::debug!(command = %command, "Running AzureML CLI");

        let result = self.execute(&command, args).await;
        timer.finish_with_result(result.as_ref());
        result
    }

    async fn execute(&self, command: &str, args: &[&str]) -> DeployResult<String> {
        let output = Command::new(&self.program)
            .args(self.arguments(args))
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command: command.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::trace!(command = %command, stdout = %stdout, "AzureML CLI output");
        Ok(stdout)
    }

    /// Run `az ml <args>` and parse its output as JSON.
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> DeployResult<T> {
        let output = self.run(args).await?;
        extract_json(&self.command_line(args), &output)
    }
}

/// Parse a JSON document from CLI output, skipping any preamble such as
/// extension warnings printed before the document.
pub fn extract_json<T: DeserializeOwned>(command: &str, output: &str) -> DeployResult<T> {
    if let Ok(value) = serde_json::from_str(output.trim()) {
        return Ok(value);
    }

    let start = JSON_START
        .as_ref()
        .and_then(|re| re.find(output))
        .ok_or_else(|| DeployError::UnexpectedOutput {
            command: command.to_string(),
            reason: "no JSON document in output".to_string(),
        })?;

    serde_json::from_str(&output[start.start()..]).map_err(|e| DeployError::UnexpectedOutput {
        command: command.to_string(),
        reason: e.to_string(),
    })
}
