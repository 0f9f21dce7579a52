//! Schedule compilation errors.
//!
//! Every failure the compiler can produce is an authoring mistake in a
//! static description file, so none of them are retried. Each error exposes
//! a stable [`ScheduleErrorKind`], a human readable message and, for schema
//! mismatches, the canonical template the user is expected to copy.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::frequency::Frequency;

/// Discriminant of a [`ScheduleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScheduleErrorKind {
    /// Both schedule files are present.
    ScheduleFileConflict,
    /// Neither schedule file is present.
    ScheduleFileMissing,
    /// Field list or field order does not match the frequency schema.
    SchemaMismatch,
    /// A field value could not be parsed.
    MalformedField,
    /// A required field is absent or empty.
    MissingField,
    /// The declared frequency is not one of the known values.
    UnknownFrequency,
    /// The description could not be read or is not valid YAML.
    Unreadable,
}

/// A schedule compilation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error(
        "found both a time-based ({}) and a change-based ({}) schedule file; \
         only one type of scheduling can be used, delete one of them",
        time_based.display(),
        change_based.display()
    )]
    FileConflict {
        time_based: PathBuf,
        change_based: PathBuf,
    },

    #[error(
        "no schedule file found; create either {} or {}",
        time_based.display(),
        change_based.display()
    )]
    FileMissing {
        time_based: PathBuf,
        change_based: PathBuf,
    },

    #[error(
        "schedule file is not in the correct format{}: found fields [{}]{}",
        declared(frequency.as_ref()),
        found.join(", "),
        expected_fields(frequency.as_ref())
    )]
    SchemaMismatch {
        /// `None` when the description does not declare a frequency.
        frequency: Option<Frequency>,
        found: Vec<String>,
        template: String,
    },

    #[error("field \"{field}\" is malformed: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("required field \"{field}\" is missing or empty")]
    MissingField { field: String },

    #[error(
        "unknown frequency \"{value}\"; expected one of {}",
        Frequency::ALL.map(Frequency::as_str).join(", ")
    )]
    UnknownFrequency { value: String },

    #[error("could not read schedule description{}: {reason}", source_suffix(path.as_ref()))]
    Unreadable {
        path: Option<PathBuf>,
        reason: String,
    },
}

fn declared(frequency: Option<&Frequency>) -> String {
    frequency
        .map(|f| format!(" for frequency \"{f}\""))
        .unwrap_or_else(|| " (no frequency declared)".to_string())
}

fn expected_fields(frequency: Option<&Frequency>) -> String {
    frequency
        .map(|f| format!(", expected [{}]", f.fields().join(", ")))
        .unwrap_or_default()
}

fn source_suffix(path: Option<&PathBuf>) -> String {
    path.map(|p| format!(" {}", p.display())).unwrap_or_default()
}

impl ScheduleError {
    /// Create a malformed field error.
    #[must_use]
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Stable discriminant for this error.
    #[must_use]
    pub fn kind(&self) -> ScheduleErrorKind {
        match self {
            Self::FileConflict { .. } => ScheduleErrorKind::ScheduleFileConflict,
            Self::FileMissing { .. } => ScheduleErrorKind::ScheduleFileMissing,
            Self::SchemaMismatch { .. } => ScheduleErrorKind::SchemaMismatch,
            Self::MalformedField { .. } => ScheduleErrorKind::MalformedField,
            Self::MissingField { .. } => ScheduleErrorKind::MissingField,
            Self::UnknownFrequency { .. } => ScheduleErrorKind::UnknownFrequency,
            Self::Unreadable { .. } => ScheduleErrorKind::Unreadable,
        }
    }

    /// The message shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Canonical template for the declared frequency, for schema mismatches.
    #[must_use]
    pub fn expected_template(&self) -> Option<&str> {
        match self {
            Self::SchemaMismatch { template, .. } => Some(template.as_str()),
            _ => None,
        }
    }

    /// Name of the offending field, when the error is about a single field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedField { field, .. } | Self::MissingField { field } => Some(field.as_str()),
            _ => None,
        }
    }

    /// Message followed by the expected template, ready to print.
    #[must_use]
    pub fn report(&self) -> String {
        match self.expected_template() {
            Some(template) => format!("{self}\n\nWe are expecting:\n{template}"),
            None => self.to_string(),
        }
    }
}

/// Result type for schedule compilation.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
