//! Compilation of schedule descriptions into normalized recurrences.
//!
//! The compiler is pure: the same description always yields the same
//! recurrence or the same error.
//!
//! | Frequency | Required fields (in order)                        |
//! |-----------|---------------------------------------------------|
//! | Minute    | frequency, interval                               |
//! | Hour      | frequency, interval                               |
//! | Day       | frequency, hours, minutes, interval               |
//! | Week      | frequency, hours, minutes, week_days, interval    |
//! | Month     | frequency, interval                               |

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::description::{
    ChangeBasedDescription, FIELD_DATASTORE_NAME, FIELD_DATASTORE_PATH, RecurrenceDescription,
};
use crate::error::{ScheduleError, ScheduleResult};
use crate::frequency::{
    FIELD_FREQUENCY, FIELD_HOURS, FIELD_INTERVAL, FIELD_MINUTES, FIELD_WEEK_DAYS, Frequency,
    Weekday,
};
use crate::template::{template_for, template_overview};

const MAX_HOUR: i64 = 23;
const MAX_MINUTE: i64 = 59;

/// Start reference handed to the platform: the earliest timestamp it accepts,
/// which makes a schedule fire at its next occurrence.
#[must_use]
pub fn earliest_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Time zone a recurrence is evaluated in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeZone {
    #[default]
    #[serde(rename = "UTC")]
    Utc,
}

/// Which schedule description style applies to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScheduleMode {
    TimeBased,
    ChangeBased,
    None,
    Conflict,
}

/// Decide the schedule mode from which description files exist.
#[must_use]
pub fn resolve_schedule_mode(time_based_exists: bool, change_based_exists: bool) -> ScheduleMode {
    match (time_based_exists, change_based_exists) {
        (true, true) => ScheduleMode::Conflict,
        (true, false) => ScheduleMode::TimeBased,
        (false, true) => ScheduleMode::ChangeBased,
        (false, false) => ScheduleMode::None,
    }
}

/// Schema-valid wall-clock recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecurrence {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_days: Option<Vec<Weekday>>,
    pub start_time: NaiveDateTime,
    pub time_zone: TimeZone,
    pub continue_on_step_failure: bool,
}

/// Recurrence triggered by data changes in a datastore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBasedRecurrence {
    pub datastore_name: String,
    pub datastore_path: String,
    pub continue_on_step_failure: bool,
}

/// A compiled schedule, ready for the scheduling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScheduleRequest {
    TimeBased(NormalizedRecurrence),
    ChangeBased(ChangeBasedRecurrence),
}

impl ScheduleRequest {
    #[must_use]
    pub fn mode(&self) -> ScheduleMode {
        match self {
            Self::TimeBased(_) => ScheduleMode::TimeBased,
            Self::ChangeBased(_) => ScheduleMode::ChangeBased,
        }
    }
}

/// Validate a time-based description against its frequency schema.
pub fn compile_time_based(
    description: &RecurrenceDescription,
) -> ScheduleResult<NormalizedRecurrence> {
    if !description.contains(FIELD_FREQUENCY) {
        return Err(ScheduleError::SchemaMismatch {
            frequency: None,
            found: found_keys(description),
            template: template_overview(),
        });
    }
    let frequency: Frequency = description
        .get(FIELD_FREQUENCY)
        .ok_or_else(|| ScheduleError::missing(FIELD_FREQUENCY))?
        .parse()?;

    // Ordered comparison: a reordered file is rejected like a wrong one.
    if !description.keys().eq(frequency.fields().iter().copied()) {
        return Err(ScheduleError::SchemaMismatch {
            frequency: Some(frequency),
            found: found_keys(description),
            template: template_for(frequency),
        });
    }

    let (hours, minutes) = if frequency.uses_time_of_day() {
        (
            Some(parse_bounded_list(description, FIELD_HOURS, MAX_HOUR)?),
            Some(parse_bounded_list(description, FIELD_MINUTES, MAX_MINUTE)?),
        )
    } else {
        (None, None)
    };

    let week_days = if frequency.uses_week_days() {
        Some(parse_week_days(description)?)
    } else {
        None
    };

    let interval = parse_interval(description)?;

    tracing::debug!(%frequency, interval, "Compiled time-based recurrence");

    Ok(NormalizedRecurrence {
        frequency,
        interval,
        hours,
        minutes,
        week_days,
        start_time: earliest_start(),
        time_zone: TimeZone::Utc,
        continue_on_step_failure: false,
    })
}

/// Validate a change-based description.
pub fn compile_change_based(
    description: &ChangeBasedDescription,
) -> ScheduleResult<ChangeBasedRecurrence> {
    let datastore_name = non_empty(description.datastore_name.as_deref(), FIELD_DATASTORE_NAME)?;
    let datastore_path = non_empty(description.datastore_path.as_deref(), FIELD_DATASTORE_PATH)?;

    tracing::debug!(%datastore_name, %datastore_path, "Compiled change-based recurrence");

    Ok(ChangeBasedRecurrence {
        datastore_name,
        datastore_path,
        continue_on_step_failure: false,
    })
}

fn found_keys(description: &RecurrenceDescription) -> Vec<String> {
    description.keys().map(str::to_string).collect()
}

fn non_empty(value: Option<&str>, field: &str) -> ScheduleResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ScheduleError::missing(field)),
    }
}

fn required<'a>(description: &'a RecurrenceDescription, field: &str) -> ScheduleResult<&'a str> {
    description
        .get(field)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ScheduleError::malformed(field, "value is empty"))
}

fn tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim)
}

fn parse_bounded_list(
    description: &RecurrenceDescription,
    field: &str,
    max: i64,
) -> ScheduleResult<Vec<u8>> {
    tokens(required(description, field)?)
        .map(|token| {
            let number = token.parse::<i64>().map_err(|e| {
                ScheduleError::malformed(field, format!("\"{token}\" is not an integer ({e})"))
            })?;
            u8::try_from(number)
                .ok()
                .filter(|n| i64::from(*n) <= max)
                .ok_or_else(|| {
                    ScheduleError::malformed(field, format!("{number} is outside 0-{max}"))
                })
        })
        .collect()
}

fn parse_week_days(description: &RecurrenceDescription) -> ScheduleResult<Vec<Weekday>> {
    tokens(required(description, FIELD_WEEK_DAYS)?)
        .map(str::parse::<Weekday>)
        .collect()
}

fn parse_interval(description: &RecurrenceDescription) -> ScheduleResult<u32> {
    let raw = required(description, FIELD_INTERVAL)?.trim();
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(ScheduleError::malformed(
            FIELD_INTERVAL,
            format!("\"{raw}\" is not a positive integer"),
        )),
        Ok(interval) => Ok(interval),
    }
}
