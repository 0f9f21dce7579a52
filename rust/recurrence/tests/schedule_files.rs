//! Mode resolution and compilation against real files on disk.

use std::fs;

use azml_recurrence::{
    Frequency, ScheduleErrorKind, ScheduleFiles, ScheduleMode, ScheduleRequest, Weekday,
};
use tempfile::TempDir;

const WEEKLY: &str = r#"scheduler:
  frequency: "Week"
  hours: "9"
  minutes: "0"
  week_days: "Monday,Wednesday"
  interval: "2"
"#;

const CHANGE: &str = r"scheduler:
  datastore_name: workspaceblobstore
  datastore_path: landing/orders
";

fn project() -> (TempDir, ScheduleFiles) {
    let dir = TempDir::new().unwrap();
    let files = ScheduleFiles::in_dir(dir.path());
    (dir, files)
}

#[test]
fn no_file_is_missing() {
    let (_dir, files) = project();

    assert_eq!(files.mode(), ScheduleMode::None);
    let err = files.compile().unwrap_err();
    assert_eq!(err.kind(), ScheduleErrorKind::ScheduleFileMissing);
    assert!(err.to_string().contains("timebased_schedule.yml"));
}

#[test]
fn both_files_conflict() {
    let (_dir, files) = project();
    fs::write(&files.time_based, WEEKLY).unwrap();
    fs::write(&files.change_based, CHANGE).unwrap();

    assert_eq!(files.mode(), ScheduleMode::Conflict);
    let err = files.compile().unwrap_err();
    assert_eq!(err.kind(), ScheduleErrorKind::ScheduleFileConflict);
}

#[test]
fn time_based_file_compiles() {
    let (_dir, files) = project();
    fs::write(&files.time_based, WEEKLY).unwrap();

    assert_eq!(files.mode(), ScheduleMode::TimeBased);
    let ScheduleRequest::TimeBased(recurrence) = files.compile().unwrap() else {
        panic!("expected a time-based request");
    };
    assert_eq!(recurrence.frequency, Frequency::Week);
    assert_eq!(recurrence.hours, Some(vec![9]));
    assert_eq!(recurrence.minutes, Some(vec![0]));
    assert_eq!(
        recurrence.week_days,
        Some(vec![Weekday::Monday, Weekday::Wednesday])
    );
    assert_eq!(recurrence.interval, 2);
}

#[test]
fn change_based_file_compiles() {
    let (_dir, files) = project();
    fs::write(&files.change_based, CHANGE).unwrap();

    let request = files.compile().unwrap();
    assert_eq!(request.mode(), ScheduleMode::ChangeBased);
    let ScheduleRequest::ChangeBased(trigger) = request else {
        panic!("expected a change-based request");
    };
    assert_eq!(trigger.datastore_name, "workspaceblobstore");
    assert_eq!(trigger.datastore_path, "landing/orders");
}

#[test]
fn reordered_file_reports_template() {
    let (_dir, files) = project();
    fs::write(
        &files.time_based,
        "scheduler:\n  frequency: Day\n  minutes: \"0\"\n  hours: \"10\"\n  interval: \"1\"\n",
    )
    .unwrap();

    let err = files.compile().unwrap_err();
    assert_eq!(err.kind(), ScheduleErrorKind::SchemaMismatch);
    let report = err.report();
    assert!(report.contains("found fields [frequency, minutes, hours, interval]"));
    assert!(report.contains("We are expecting"));
}

#[test]
fn change_based_without_path_is_missing_field() {
    let (_dir, files) = project();
    fs::write(&files.change_based, "scheduler:\n  datastore_name: lake\n").unwrap();

    let err = files.compile().unwrap_err();
    assert_eq!(err.kind(), ScheduleErrorKind::MissingField);
    assert_eq!(err.field(), Some("datastore_path"));
}
