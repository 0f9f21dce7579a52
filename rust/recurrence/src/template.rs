//! Canonical schedule file templates shown when a description is rejected.

use std::fmt::Write as _;

use crate::frequency::{
    FIELD_FREQUENCY, FIELD_HOURS, FIELD_INTERVAL, FIELD_MINUTES, FIELD_WEEK_DAYS, Frequency,
};

/// Top-level key wrapping the schedule fields.
pub const SCHEDULER_KEY: &str = "scheduler";

/// Render the `timebased_schedule.yml` a user should write for `frequency`.
///
/// Fields appear in canonical order, so the output compiles as-is.
#[must_use]
pub fn template_for(frequency: Frequency) -> String {
    let mut out = format!("{SCHEDULER_KEY}:\n");
    for field in frequency.fields() {
        let (value, comment) = example(frequency, field);
        // Writing into a String cannot fail.
        let _ = writeln!(out, "  {field}: \"{value}\" # {comment}");
    }
    out
}

/// Every frequency's template, for descriptions that declare no frequency.
#[must_use]
pub fn template_overview() -> String {
    Frequency::ALL
        .into_iter()
        .map(|freq| format!("# {freq}\n{}", template_for(freq)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn example(frequency: Frequency, field: &str) -> (&'static str, &'static str) {
    match field {
        FIELD_FREQUENCY => (
            frequency.as_str(),
            "\"Minute\", \"Hour\", \"Day\", \"Week\", or \"Month\"",
        ),
        FIELD_HOURS => (
            "10,12,14,16,18,20,22",
            "hours of the day (0-23) separated by comma",
        ),
        FIELD_MINUTES => ("0", "minutes of the hour (0-59) separated by comma"),
        FIELD_WEEK_DAYS => (
            "Monday,Tuesday,Wednesday,Thursday,Friday,Saturday,Sunday",
            "week days separated by comma",
        ),
        FIELD_INTERVAL => ("1", "how many periods between runs"),
        _ => ("", ""),
    }
}
