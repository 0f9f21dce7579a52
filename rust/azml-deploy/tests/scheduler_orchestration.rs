//! Schedule replacement against an in-memory scheduling service.

use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;
use azml_deploy::scheduler::{
    ScheduleSpec, ScheduleSummary, ScheduleTarget, Scheduler, SchedulingService,
};
use azml_deploy::{DeployError, DeployResult};
use azml_recurrence::{Frequency, ScheduleErrorKind, ScheduleFiles, ScheduleRequest};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Default)]
struct FakeService {
    existing: Vec<ScheduleSummary>,
    missing_endpoint: bool,
    calls: Mutex<Vec<String>>,
    created: Mutex<Option<ScheduleSpec>>,
}

impl FakeService {
    fn with_schedules(statuses: &[(&str, &str)]) -> Self {
        Self {
            existing: statuses
                .iter()
                .map(|(id, status)| ScheduleSummary {
                    id: (*id).to_string(),
                    name: format!("schedule {id}"),
                    pipeline_id: Some("pipe-1".to_string()),
                    status: (*status).to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulingService for &FakeService {
    async fn published_pipeline_id(&self, endpoint_name: &str) -> DeployResult<String> {
        self.record(format!("endpoint {endpoint_name}"));
        if self.missing_endpoint {
            return Err(DeployError::CommandFailed {
                command: "az ml endpoint pipeline show".into(),
                status: 1,
                stderr: "ResourceNotFound".into(),
            });
        }
        Ok("pipe-1".to_string())
    }

    async fn schedules_for_pipeline(
        &self,
        pipeline_id: &str,
    ) -> DeployResult<Vec<ScheduleSummary>> {
        self.record(format!("list {pipeline_id}"));
        Ok(self.existing.clone())
    }

    async fn disable_schedule(&self, schedule_id: &str) -> DeployResult<()> {
        self.record(format!("disable {schedule_id}"));
        Ok(())
    }

    async fn create_schedule(&self, spec: &ScheduleSpec) -> DeployResult<ScheduleSummary> {
        self.record(format!("create {}", spec.name));
        *self.created.lock().unwrap() = Some(spec.clone());
        Ok(ScheduleSummary {
            id: "new".to_string(),
            name: spec.name.clone(),
            pipeline_id: Some(spec.pipeline_id.clone()),
            status: "Active".to_string(),
        })
    }
}

fn target() -> ScheduleTarget {
    ScheduleTarget {
        pipeline_name: "sales_default".to_string(),
        experiment_name: "sales".to_string(),
        description: "nightly refresh".to_string(),
        wait_timeout_secs: 3600,
    }
}

fn project_with(file: &str, contents: &str) -> (TempDir, ScheduleFiles) {
    let dir = TempDir::new().unwrap();
    let files = ScheduleFiles::in_dir(dir.path());
    fs::write(dir.path().join(file), contents).unwrap();
    (dir, files)
}

const DAILY: &str = "scheduler:\n  frequency: Day\n  hours: \"10,12\"\n  minutes: \"0\"\n  interval: \"1\"\n";

#[tokio::test]
async fn replaces_active_schedules_then_creates() {
    let (_dir, files) = project_with("timebased_schedule.yml", DAILY);
    let service = FakeService::with_schedules(&[("a", "Active"), ("b", "Disabled"), ("c", "Active")]);

    let created = assert_ok!(Scheduler::new(&service, files, target()).run().await);
    assert_eq!(created.name, "sales_default");

    assert_eq!(
        service.calls(),
        [
            "endpoint sales_default",
            "list pipe-1",
            "disable a",
            "disable c",
            "create sales_default",
        ]
    );

    let spec = service.created.lock().unwrap().clone().unwrap();
    assert_eq!(spec.pipeline_id, "pipe-1");
    assert_eq!(spec.experiment_name, "sales");
    assert_eq!(spec.description, "nightly refresh");
    assert!(spec.wait_for_provisioning);
    let ScheduleRequest::TimeBased(recurrence) = spec.request else {
        panic!("expected a time-based request");
    };
    assert_eq!(recurrence.frequency, Frequency::Day);
    assert_eq!(recurrence.hours, Some(vec![10, 12]));
}

#[tokio::test]
async fn malformed_file_never_reaches_service() {
    let (_dir, files) = project_with(
        "timebased_schedule.yml",
        "scheduler:\n  frequency: Day\n  minutes: \"0\"\n  hours: \"10\"\n  interval: \"1\"\n",
    );
    let service = FakeService::with_schedules(&[("a", "Active")]);

    let err = assert_err!(Scheduler::new(&service, files, target()).run().await);
    let DeployError::Schedule(schedule_error) = &err else {
        panic!("expected a schedule error, got {err}");
    };
    assert_eq!(schedule_error.kind(), ScheduleErrorKind::SchemaMismatch);
    assert!(err.report().contains("We are expecting"));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn missing_files_never_reach_service() {
    let dir = TempDir::new().unwrap();
    let service = FakeService::default();

    let err = assert_err!(
        Scheduler::new(&service, ScheduleFiles::in_dir(dir.path()), target())
            .run()
            .await
    );
    assert!(matches!(err, DeployError::Schedule(_)));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn change_based_request_is_forwarded() {
    let (_dir, files) = project_with(
        "changebased_schedule.yml",
        "scheduler:\n  datastore_name: lake\n  datastore_path: landing/orders\n",
    );
    let service = FakeService::default();

    assert_ok!(Scheduler::new(&service, files, target()).run().await);

    let spec = service.created.lock().unwrap().clone().unwrap();
    let ScheduleRequest::ChangeBased(trigger) = spec.request else {
        panic!("expected a change-based request");
    };
    assert_eq!(trigger.datastore_name, "lake");
    assert_eq!(trigger.datastore_path, "landing/orders");
    assert!(!trigger.continue_on_step_failure);
}

#[tokio::test]
async fn unresolved_endpoint_stops_before_disabling() {
    let (_dir, files) = project_with("timebased_schedule.yml", DAILY);
    let service = FakeService {
        missing_endpoint: true,
        ..FakeService::with_schedules(&[("a", "Active")])
    };

    let err = assert_err!(Scheduler::new(&service, files, target()).run().await);
    match err {
        DeployError::PublishedPipelineNotFound { endpoint, reason } => {
            assert_eq!(endpoint, "sales_default");
            assert!(reason.contains("ResourceNotFound"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.calls(), ["endpoint sales_default"]);
}

#[test]
fn validate_does_not_need_the_service() {
    let (_dir, files) = project_with("timebased_schedule.yml", DAILY);
    let service = FakeService::default();

    let request = Scheduler::new(&service, files, target()).validate().unwrap();
    assert_eq!(request.mode(), azml_recurrence::ScheduleMode::TimeBased);
    assert!(service.calls().is_empty());
}
