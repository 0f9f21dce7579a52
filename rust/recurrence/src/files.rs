//! Schedule description files of a project and the mode state machine.

use std::path::{Path, PathBuf};

use crate::compiler::{
    ScheduleMode, ScheduleRequest, compile_change_based, compile_time_based, resolve_schedule_mode,
};
use crate::description::{ChangeBasedDescription, RecurrenceDescription};
use crate::error::{ScheduleError, ScheduleResult};

/// File name of the wall-clock schedule description.
pub const TIMEBASED_SCHEDULE_FILENAME: &str = "timebased_schedule.yml";
/// File name of the data-change schedule description.
pub const CHANGEBASED_SCHEDULE_FILENAME: &str = "changebased_schedule.yml";
/// Directory holding both files, relative to the project root.
pub const DEFAULT_CONF_DIR: &str = "conf/base";

/// Locations of the two mutually exclusive schedule descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFiles {
    pub time_based: PathBuf,
    pub change_based: PathBuf,
}

impl ScheduleFiles {
    /// The standard file names inside `conf_dir`.
    #[must_use]
    pub fn in_dir(conf_dir: impl AsRef<Path>) -> Self {
        let conf_dir = conf_dir.as_ref();
        Self {
            time_based: conf_dir.join(TIMEBASED_SCHEDULE_FILENAME),
            change_based: conf_dir.join(CHANGEBASED_SCHEDULE_FILENAME),
        }
    }

    /// Mode implied by which files currently exist.
    #[must_use]
    pub fn mode(&self) -> ScheduleMode {
        resolve_schedule_mode(self.time_based.exists(), self.change_based.exists())
    }

    /// Read whichever description applies and compile it.
    pub fn compile(&self) -> ScheduleResult<ScheduleRequest> {
        let mode = self.mode();
        tracing::debug!(?mode, time_based = %self.time_based.display(), "Resolved schedule mode");

        match mode {
            ScheduleMode::Conflict => Err(ScheduleError::FileConflict {
                time_based: self.time_based.clone(),
                change_based: self.change_based.clone(),
            }),
            ScheduleMode::None => Err(ScheduleError::FileMissing {
                time_based: self.time_based.clone(),
                change_based: self.change_based.clone(),
            }),
            ScheduleMode::TimeBased => {
                let description = RecurrenceDescription::from_path(&self.time_based)?;
                compile_time_based(&description).map(ScheduleRequest::TimeBased)
            }
            ScheduleMode::ChangeBased => {
                let description = ChangeBasedDescription::from_path(&self.change_based)?;
                compile_change_based(&description).map(ScheduleRequest::ChangeBased)
            }
        }
    }
}

impl Default for ScheduleFiles {
    fn default() -> Self {
        Self::in_dir(DEFAULT_CONF_DIR)
    }
}
