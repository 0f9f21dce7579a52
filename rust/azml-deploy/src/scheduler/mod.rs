//! Schedule submission for published pipelines.
//!
//! The schedule files are compiled first; only a valid request reaches the
//! workspace. Every schedule attached to the published pipeline is then
//! disabled and a single new one is created.

pub mod az;

pub use az::{AzCliScheduling, render_schedule_yaml};

use async_trait::async_trait;
use azml_recurrence::{ScheduleFiles, ScheduleRequest};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigResult, DeployConfig};
use crate::error::{DeployError, DeployResult};
use crate::log_step;

/// Everything the scheduling service needs to create one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSpec {
    /// Schedule name, the AzureML pipeline name.
    pub name: String,
    /// Published pipeline the schedule submits.
    pub pipeline_id: String,
    /// Experiment the runs are recorded under.
    pub experiment_name: String,
    pub description: String,
    /// Compiled recurrence or change trigger.
    pub request: ScheduleRequest,
    pub wait_for_provisioning: bool,
    pub wait_timeout_secs: u64,
}

/// A schedule as reported by the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "pipelineId", alias = "pipeline_id")]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl ScheduleSummary {
    /// Whether the workspace already reports this schedule as disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.status.eq_ignore_ascii_case("disabled")
    }
}

/// Workspace operations needed to replace a pipeline's schedules.
#[async_trait]
pub trait SchedulingService: Send + Sync {
    /// Id of the pipeline currently published behind `endpoint_name`.
    async fn published_pipeline_id(&self, endpoint_name: &str) -> DeployResult<String>;

    /// Schedules attached to a published pipeline.
    async fn schedules_for_pipeline(&self, pipeline_id: &str)
    -> DeployResult<Vec<ScheduleSummary>>;

    /// Disable one schedule.
    async fn disable_schedule(&self, schedule_id: &str) -> DeployResult<()>;

    /// Create a schedule and wait for it to be provisioned.
    async fn create_schedule(&self, spec: &ScheduleSpec) -> DeployResult<ScheduleSummary>;
}

/// Names and settings of the schedule being deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTarget {
    /// AzureML pipeline name, shared by the endpoint and the schedule.
    pub pipeline_name: String,
    pub experiment_name: String,
    pub description: String,
    pub wait_timeout_secs: u64,
}

impl ScheduleTarget {
    /// Derive the target from the deployment configuration.
    pub fn from_config(config: &DeployConfig) -> ConfigResult<Self> {
        Ok(Self {
            pipeline_name: config.azure_pipeline_name()?,
            experiment_name: config.experiment_name()?,
            description: config.description.clone(),
            wait_timeout_secs: config.wait_timeout_secs,
        })
    }
}

/// Compiles a project's schedule files and submits the result.
#[derive(Debug)]
pub struct Scheduler<S> {
    service: S,
    files: ScheduleFiles,
    target: ScheduleTarget,
}

impl<S: SchedulingService> Scheduler<S> {
    #[must_use]
    pub fn new(service: S, files: ScheduleFiles, target: ScheduleTarget) -> Self {
        Self {
            service,
            files,
            target,
        }
    }

    /// Compile the schedule files without contacting the workspace.
    pub fn validate(&self) -> DeployResult<ScheduleRequest> {
        Ok(self.files.compile()?)
    }

    /// Replace the pipeline's schedules with the one described on disk.
    pub async fn run(&self) -> DeployResult<ScheduleSummary> {
        let request = self.validate()?;
        log_step!(1, 4, "Compiled schedule", format!("{:?}", request.mode()));

        let endpoint = self.target.pipeline_name.as_str();
        let pipeline_id = self
            .service
            .published_pipeline_id(endpoint)
            .await
            .map_err(|e| match e {
                DeployError::PublishedPipelineNotFound { .. } => e,
                other => DeployError::PublishedPipelineNotFound {
                    endpoint: endpoint.to_string(),
                    reason: other.to_string(),
                },
            })?;
        log_step!(2, 4, "Resolved published pipeline", &pipeline_id);

        let existing = self.service.schedules_for_pipeline(&pipeline_id).await?;
        let mut disabled = 0usize;
        for schedule in existing.iter().filter(|s| !s.is_disabled()) {
            tracing::info!(schedule_id = %schedule.id, name = %schedule.name, "Disabling schedule");
            self.service.disable_schedule(&schedule.id).await?;
            disabled += 1;
        }
        log_step!(3, 4, "Disabled existing schedules", disabled);

        let spec = ScheduleSpec {
            name: self.target.pipeline_name.clone(),
            pipeline_id,
            experiment_name: self.target.experiment_name.clone(),
            description: self.target.description.clone(),
            request,
            wait_for_provisioning: true,
            wait_timeout_secs: self.target.wait_timeout_secs,
        };
        let created = self.service.create_schedule(&spec).await?;
        log_step!(4, 4, "Created schedule", &created.id);

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_cli_json() {
        let summary: ScheduleSummary = serde_json::from_str(
            r#"{"id": "s1", "name": "sales_default", "pipelineId": "p1", "status": "Active"}"#,
        )
        .unwrap();
        assert_eq!(summary.pipeline_id.as_deref(), Some("p1"));
        assert!(!summary.is_disabled());
    }

    #[test]
    fn test_summary_minimal_json() {
        let summary: ScheduleSummary =
            serde_json::from_str(r#"{"id": "s1", "status": "Disabled"}"#).unwrap();
        assert!(summary.is_disabled());
        assert!(summary.name.is_empty());
    }

    #[test]
    fn test_target_from_config() {
        let config = DeployConfig {
            project: Some("sales".into()),
            experiment: "dev".into(),
            description: "nightly refresh".into(),
            ..DeployConfig::default()
        };
        let target = ScheduleTarget::from_config(&config).unwrap();
        assert_eq!(target.pipeline_name, "sales_default_dev");
        assert_eq!(target.experiment_name, "sales_dev");
        assert_eq!(target.wait_timeout_secs, 3600);
    }
}
