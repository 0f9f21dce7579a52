//! Schedule-description compiler for AzureML pipeline recurrences.
//!
//! A project describes how its published pipeline should recur in one of two
//! mutually exclusive files under `conf/base`:
//!
//! - `timebased_schedule.yml`: wall-clock cadence (`Minute`, `Hour`, `Day`,
//!   `Week` or `Month`, with hours, minutes and week days where relevant);
//! - `changebased_schedule.yml`: re-run when data changes at a datastore path.
//!
//! This crate turns those files into a [`ScheduleRequest`] the scheduling
//! service can submit, or a [`ScheduleError`] explaining what to fix.
//!
//! # Example
//!
//! ```rust
//! use azml_recurrence::{Frequency, RecurrenceDescription, compile_time_based};
//!
//! let description = RecurrenceDescription::from_yaml_str(
//!     "scheduler:\n  frequency: Day\n  hours: \"10,12\"\n  minutes: \"0\"\n  interval: \"1\"\n",
//! )?;
//! let recurrence = compile_time_based(&description)?;
//! assert_eq!(recurrence.frequency, Frequency::Day);
//! assert_eq!(recurrence.hours, Some(vec![10, 12]));
//! # Ok::<(), azml_recurrence::ScheduleError>(())
//! ```

pub mod compiler;
pub mod description;
pub mod error;
pub mod files;
pub mod frequency;
pub mod template;

pub use compiler::{
    ChangeBasedRecurrence, NormalizedRecurrence, ScheduleMode, ScheduleRequest, TimeZone,
    compile_change_based, compile_time_based, earliest_start, resolve_schedule_mode,
};
pub use description::{ChangeBasedDescription, DescriptionField, RecurrenceDescription};
pub use error::{ScheduleError, ScheduleErrorKind, ScheduleResult};
pub use files::{
    CHANGEBASED_SCHEDULE_FILENAME, DEFAULT_CONF_DIR, ScheduleFiles, TIMEBASED_SCHEDULE_FILENAME,
};
pub use frequency::{Frequency, Weekday};
pub use template::{template_for, template_overview};
