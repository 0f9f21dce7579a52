//! Configuration validation for azml-deploy.
//!
//! Each subcommand needs a different subset of settings. The validator
//! checks the subset for the requested [`Operation`] and reports every
//! problem at once.

use super::DeployConfig;
use super::error::{ConfigResult, ConfigurationError};

/// What the configuration is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Compile and submit a schedule.
    Schedule,
    /// Compile a schedule without touching the workspace.
    ValidateSchedule,
    /// Create or reuse an environment.
    Environment,
    /// Write a storage credential into the project configuration.
    Credential,
}

impl Operation {
    fn needs_workspace(self) -> bool {
        matches!(self, Self::Schedule | Self::Environment)
    }

    fn needs_project(self) -> bool {
        matches!(self, Self::Schedule | Self::Environment)
    }
}

/// Configuration validator.
///
/// | Operation         | resource group | workspace | project | python |
/// |-------------------|----------------|-----------|---------|--------|
/// | schedule          | YES            | YES       | YES     | no     |
/// | validate-schedule | no             | no        | no      | no     |
/// | environment       | YES            | YES       | YES     | YES    |
/// | credential        | no             | no        | no      | no     |
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration for `operation`.
    ///
    /// Returns `Ok(())` if valid, or a `ConfigurationError` with all issues.
    pub fn validate(config: &DeployConfig, operation: Operation) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if operation.needs_workspace() {
            errors.extend(Self::validate_workspace(config));
        }
        if operation.needs_project() {
            if let Err(e) = Self::validate_project(config) {
                errors.push(e);
            }
        }
        if operation == Operation::Environment {
            if let Err(e) = Self::validate_python(&config.python) {
                errors.push(e);
            }
        }
        if config.pipeline.trim().is_empty() {
            errors.push(ConfigurationError::invalid(
                "pipeline name is empty",
                "Pass --pipeline or unset AZML_PIPELINE to use \"__default__\"",
            ));
        }

        ConfigurationError::from_list(errors).map_or(Ok(()), Err)
    }

    /// Check that both workspace coordinates are present.
    #[must_use]
    pub fn validate_workspace(config: &DeployConfig) -> Vec<ConfigurationError> {
        let mut errors = Vec::new();
        if is_blank(config.resource_group.as_deref()) {
            errors.push(ConfigurationError::missing_required(
                "resource group",
                "Calling the AzureML CLI",
                "--resource-group or AZML_RESOURCE_GROUP",
            ));
        }
        if is_blank(config.workspace.as_deref()) {
            errors.push(ConfigurationError::missing_required(
                "workspace",
                "Calling the AzureML CLI",
                "--workspace or AZML_WORKSPACE",
            ));
        }
        errors
    }

    /// Check the project name is present and usable in derived names.
    pub fn validate_project(config: &DeployConfig) -> ConfigResult<()> {
        let project = config.project_name()?;
        if project.trim().is_empty() {
            return Err(ConfigurationError::missing_required(
                "project",
                "Naming the experiment, pipeline and environment",
                "--project or AZML_PROJECT",
            ));
        }
        if project.chars().any(char::is_whitespace) {
            return Err(ConfigurationError::invalid(
                format!("project name '{project}' contains whitespace"),
                "Use letters, digits, '-' or '_' in the project name",
            ));
        }
        Ok(())
    }

    /// Check a `major.minor[.micro]` python version.
    pub fn validate_python(version: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = version.split('.').collect();
        let numeric = parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
        if numeric && (2..=3).contains(&parts.len()) {
            Ok(())
        } else {
            Err(ConfigurationError::invalid(
                format!("python version '{version}' is not major.minor"),
                "Set AZML_PYTHON to a version such as 3.8",
            ))
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
