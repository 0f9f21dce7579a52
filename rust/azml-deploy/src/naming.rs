//! Names derived from the project for experiments and AzureML pipelines.

use crate::config::DEFAULT_PIPELINE;

/// Experiment name: the project, with `_<suffix>` when a suffix is given.
#[must_use]
pub fn experiment_name(project: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        project.to_string()
    } else {
        format!("{project}_{suffix}")
    }
}

/// Default AzureML pipeline name.
///
/// `project` plus `_default` for the default Kedro pipeline or
/// `_<pipeline>` otherwise, followed by whatever the experiment name adds
/// after the project name.
///
/// ```rust
/// use azml_deploy::naming::azure_pipeline_name;
///
/// assert_eq!(azure_pipeline_name("sales", "__default__", "sales"), "sales_default");
/// assert_eq!(azure_pipeline_name("sales", "train", "sales_dev"), "sales_train_dev");
/// ```
#[must_use]
pub fn azure_pipeline_name(project: &str, pipeline: &str, experiment: &str) -> String {
    let mut name = project.to_string();

    if pipeline == DEFAULT_PIPELINE {
        name.push_str("_default");
    } else {
        name.push('_');
        name.push_str(pipeline);
    }

    if experiment != project {
        let tail = if project.is_empty() {
            experiment
        } else {
            experiment.rsplit(project).next().unwrap_or(experiment)
        };
        name.push_str(tail);
    }

    name
}
