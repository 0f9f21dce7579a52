//! [`SchedulingService`] over the AzureML CLI.

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;
use azml_recurrence::{Frequency, NormalizedRecurrence, ScheduleRequest, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use super::{ScheduleSpec, ScheduleSummary, SchedulingService};
use crate::cli::AzCli;
use crate::error::{DeployError, DeployResult};

/// Schedule document accepted by `az ml pipeline create-schedule`.
#[derive(Debug, Serialize)]
struct ScheduleDocument<'a> {
    #[serde(rename = "Schedule")]
    schedule: ScheduleBody<'a>,
}

#[derive(Debug, Serialize)]
struct ScheduleBody<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence: Option<RecurrenceBody<'a>>,
    pipeline_parameters: BTreeMap<String, String>,
    wait_for_provisioning: bool,
    wait_timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    datastore_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_on_datastore: Option<&'a str>,
    continue_on_step_failure: bool,
}

#[derive(Debug, Serialize)]
struct RecurrenceBody<'a> {
    frequency: Frequency,
    interval: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    hours: Option<&'a [u8]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes: Option<&'a [u8]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    week_days: Option<&'a [Weekday]>,
    start_time: String,
    time_zone: TimeZone,
}

impl<'a> From<&'a NormalizedRecurrence> for RecurrenceBody<'a> {
    fn from(recurrence: &'a NormalizedRecurrence) -> Self {
        Self {
            frequency: recurrence.frequency,
            interval: recurrence.interval,
            hours: recurrence.hours.as_deref(),
            minutes: recurrence.minutes.as_deref(),
            week_days: recurrence.week_days.as_deref(),
            start_time: recurrence.start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: recurrence.time_zone,
        }
    }
}

/// Render the schedule YAML handed to `create-schedule`.
pub fn render_schedule_yaml(spec: &ScheduleSpec) -> DeployResult<String> {
    let (recurrence, trigger, continue_on_step_failure) = match &spec.request {
        ScheduleRequest::TimeBased(recurrence) => (
            Some(RecurrenceBody::from(recurrence)),
            None,
            recurrence.continue_on_step_failure,
        ),
        ScheduleRequest::ChangeBased(trigger) => {
            (None, Some(trigger), trigger.continue_on_step_failure)
        }
    };

    let document = ScheduleDocument {
        schedule: ScheduleBody {
            description: &spec.description,
            recurrence,
            pipeline_parameters: BTreeMap::new(),
            wait_for_provisioning: spec.wait_for_provisioning,
            wait_timeout: spec.wait_timeout_secs,
            datastore_name: trigger.map(|t| t.datastore_name.as_str()),
            path_on_datastore: trigger.map(|t| t.datastore_path.as_str()),
            continue_on_step_failure,
        },
    };
    Ok(serde_yaml::to_string(&document)?)
}

#[derive(Debug, Deserialize)]
struct PipelineEndpoint {
    #[serde(default, rename = "defaultPipelineId", alias = "default_pipeline_id")]
    default_pipeline_id: Option<String>,
}

/// Scheduling service backed by `az ml`.
#[derive(Debug, Clone)]
pub struct AzCliScheduling {
    az: AzCli,
}

impl AzCliScheduling {
    #[must_use]
    pub fn new(az: AzCli) -> Self {
        Self { az }
    }
}

#[async_trait]
impl SchedulingService for AzCliScheduling {
    async fn published_pipeline_id(&self, endpoint_name: &str) -> DeployResult<String> {
        let endpoint: PipelineEndpoint = self
            .az
            .run_json(&["endpoint", "pipeline", "show", "--name", endpoint_name])
            .await?;

        endpoint
            .default_pipeline_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DeployError::PublishedPipelineNotFound {
                endpoint: endpoint_name.to_string(),
                reason: "endpoint has no default published pipeline".to_string(),
            })
    }

    async fn schedules_for_pipeline(
        &self,
        pipeline_id: &str,
    ) -> DeployResult<Vec<ScheduleSummary>> {
        self.az
            .run_json(&["pipeline", "list-schedules", "--pipeline-id", pipeline_id])
            .await
    }

    async fn disable_schedule(&self, schedule_id: &str) -> DeployResult<()> {
        self.az
            .run(&["pipeline", "disable-schedule", "--schedule-id", schedule_id])
            .await?;
        Ok(())
    }

    async fn create_schedule(&self, spec: &ScheduleSpec) -> DeployResult<ScheduleSummary> {
        let yaml = render_schedule_yaml(spec)?;
        let mut file = tempfile::Builder::new()
            .prefix("schedule-")
            .suffix(".yml")
            .tempfile()?;
        file.write_all(yaml.as_bytes())?;
        file.flush()?;
        let path = file.path().to_string_lossy().into_owned();
        tracing::debug!(path = %path, schedule = %spec.name, "Rendered schedule document");

        self.az
            .run_json(&[
                "pipeline",
                "create-schedule",
                "--name",
                &spec.name,
                "--pipeline-id",
                &spec.pipeline_id,
                "--experiment-name",
                &spec.experiment_name,
                "--schedule-yaml",
                &path,
            ])
            .await
    }
}
