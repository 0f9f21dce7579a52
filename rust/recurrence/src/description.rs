//! Raw schedule descriptions as authored in YAML.
//!
//! Descriptions keep the exact key order of the source document, because the
//! compiler compares ordered key lists against the frequency schema.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{ScheduleError, ScheduleResult};
use crate::template::SCHEDULER_KEY;

/// Key holding the datastore a change-based schedule watches.
pub const FIELD_DATASTORE_NAME: &str = "datastore_name";
/// Key holding the path polled inside that datastore.
pub const FIELD_DATASTORE_PATH: &str = "datastore_path";

/// One `key: value` entry of a time-based description.
///
/// `value` is `None` when the YAML value is null or not a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionField {
    pub key: String,
    pub value: Option<String>,
}

/// Untyped time-based recurrence description, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceDescription {
    fields: Vec<DescriptionField>,
}

impl RecurrenceDescription {
    /// Build a description from ordered `(key, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| DescriptionField {
                    key: key.into(),
                    value: Some(value.into()),
                })
                .collect(),
        }
    }

    /// Parse a `timebased_schedule.yml` document.
    pub fn from_yaml_str(source: &str) -> ScheduleResult<Self> {
        let scheduler = scheduler_mapping(source, None)?;
        Ok(Self::from_mapping(&scheduler))
    }

    /// Read and parse a `timebased_schedule.yml` file.
    pub fn from_path(path: &Path) -> ScheduleResult<Self> {
        let source = read(path)?;
        let scheduler = scheduler_mapping(&source, Some(path))?;
        Ok(Self::from_mapping(&scheduler))
    }

    /// Build a description from the `scheduler` mapping itself.
    #[must_use]
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            fields: mapping
                .iter()
                .map(|(key, value)| DescriptionField {
                    key: scalar(key).unwrap_or_default(),
                    value: scalar(value),
                })
                .collect(),
        }
    }

    /// Keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.key.as_str())
    }

    /// Value of the first field named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(|field| field.value.as_deref())
    }

    /// Whether a field named `key` is declared, whatever its value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    fn field(&self, key: &str) -> Option<&DescriptionField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// Untyped change-based description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBasedDescription {
    pub datastore_name: Option<String>,
    pub datastore_path: Option<String>,
}

impl ChangeBasedDescription {
    /// Parse a `changebased_schedule.yml` document.
    pub fn from_yaml_str(source: &str) -> ScheduleResult<Self> {
        let scheduler = scheduler_mapping(source, None)?;
        Ok(Self::from_mapping(&scheduler))
    }

    /// Read and parse a `changebased_schedule.yml` file.
    pub fn from_path(path: &Path) -> ScheduleResult<Self> {
        let source = read(path)?;
        let scheduler = scheduler_mapping(&source, Some(path))?;
        Ok(Self::from_mapping(&scheduler))
    }

    /// Build a description from the `scheduler` mapping; other keys are ignored.
    #[must_use]
    pub fn from_mapping(mapping: &Mapping) -> Self {
        Self {
            datastore_name: mapping.get(FIELD_DATASTORE_NAME).and_then(scalar),
            datastore_path: mapping.get(FIELD_DATASTORE_PATH).and_then(scalar),
        }
    }
}

fn read(path: &Path) -> ScheduleResult<String> {
    std::fs::read_to_string(path).map_err(|e| ScheduleError::Unreadable {
        path: Some(path.to_path_buf()),
        reason: e.to_string(),
    })
}

fn scheduler_mapping(source: &str, path: Option<&Path>) -> ScheduleResult<Mapping> {
    let document: Value = serde_yaml::from_str(source).map_err(|e| ScheduleError::Unreadable {
        path: path.map(Path::to_path_buf),
        reason: e.to_string(),
    })?;

    match document.get(SCHEDULER_KEY) {
        Some(Value::Mapping(mapping)) => Ok(mapping.clone()),
        _ => Err(ScheduleError::missing(SCHEDULER_KEY)),
    }
}

/// Render a YAML scalar as the string the user wrote.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
