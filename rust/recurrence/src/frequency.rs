//! Recurrence frequencies, week days and their field schemas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Key holding the frequency name.
pub const FIELD_FREQUENCY: &str = "frequency";
/// Key holding the recurrence interval.
pub const FIELD_INTERVAL: &str = "interval";
/// Key holding comma separated hours of the day.
pub const FIELD_HOURS: &str = "hours";
/// Key holding comma separated minutes of the hour.
pub const FIELD_MINUTES: &str = "minutes";
/// Key holding comma separated week day names.
pub const FIELD_WEEK_DAYS: &str = "week_days";

const CADENCE_FIELDS: &[&str] = &[FIELD_FREQUENCY, FIELD_INTERVAL];
const DAY_FIELDS: &[&str] = &[FIELD_FREQUENCY, FIELD_HOURS, FIELD_MINUTES, FIELD_INTERVAL];
const WEEK_FIELDS: &[&str] = &[
    FIELD_FREQUENCY,
    FIELD_HOURS,
    FIELD_MINUTES,
    FIELD_WEEK_DAYS,
    FIELD_INTERVAL,
];

/// How often a recurrence fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl Frequency {
    /// Every frequency, in the order they are documented.
    pub const ALL: [Self; 5] = [Self::Minute, Self::Hour, Self::Day, Self::Week, Self::Month];

    /// Name as written in schedule files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "Minute",
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
        }
    }

    /// Canonical field list, in the order a description must declare them.
    #[must_use]
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Minute | Self::Hour | Self::Month => CADENCE_FIELDS,
            Self::Day => DAY_FIELDS,
            Self::Week => WEEK_FIELDS,
        }
    }

    /// Whether hours and minutes are part of the schema.
    #[must_use]
    pub fn uses_time_of_day(self) -> bool {
        matches!(self, Self::Day | Self::Week)
    }

    /// Whether week days are part of the schema.
    #[must_use]
    pub fn uses_week_days(self) -> bool {
        matches!(self, Self::Week)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str() == s.trim())
            .ok_or_else(|| ScheduleError::UnknownFrequency {
                value: s.to_string(),
            })
    }
}

/// Day of the week accepted in `week_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Every week day, starting on Sunday.
    pub const ALL: [Self; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    /// Case-insensitive full English day name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                ScheduleError::malformed(
                    FIELD_WEEK_DAYS,
                    format!(
                        "\"{name}\" is not a week day; expected one of {}",
                        Self::ALL.map(Self::as_str).join(", ")
                    ),
                )
            })
    }
}
