//! Environment reuse and registration against an in-memory registry.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use azml_deploy::environment::{
    AZUREML_ENVIRONMENT_FILENAME, CONDA_FILENAME, DOCKERFILE_FILENAME, EnvironmentCreator,
    EnvironmentRegistry,
};
use azml_deploy::{DeployError, DeployResult};
use tempfile::TempDir;

const REQUIREMENTS: &str = "# project deps\nkedro==0.18.4\npandas>=1.3\n";

#[derive(Debug, Default, Clone, Copy)]
enum Registration {
    #[default]
    Succeed,
    Fail,
    /// Removes the staging directory, then fails.
    FailAfterRemoving,
}

#[derive(Debug, Default)]
struct FakeRegistry {
    environments: HashMap<String, Vec<String>>,
    registration: Registration,
    lookups: Mutex<Vec<String>>,
    /// Files seen in the staging directory at registration time.
    registered: Mutex<Vec<(String, String)>>,
}

impl FakeRegistry {
    fn with(mut self, name: &str, packages: &[&str]) -> Self {
        self.environments.insert(
            name.to_string(),
            packages.iter().map(|p| (*p).to_string()).collect(),
        );
        self
    }

    fn failing(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }
}

#[async_trait]
impl EnvironmentRegistry for &FakeRegistry {
    async fn pip_packages(&self, name: &str) -> DeployResult<Option<Vec<String>>> {
        self.lookups.lock().unwrap().push(name.to_string());
        Ok(self.environments.get(name).cloned())
    }

    async fn register(&self, directory: &Path) -> DeployResult<()> {
        let mut seen = Vec::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            seen.push((
                entry.file_name().to_string_lossy().into_owned(),
                fs::read_to_string(entry.path())?,
            ));
        }
        seen.sort();
        *self.registered.lock().unwrap() = seen;

        let failure = DeployError::CommandFailed {
            command: "az ml environment register".into(),
            status: 1,
            stderr: "quota exceeded".into(),
        };
        match self.registration {
            Registration::Succeed => Ok(()),
            Registration::Fail => Err(failure),
            Registration::FailAfterRemoving => {
                fs::remove_dir_all(directory)?;
                Err(failure)
            }
        }
    }
}

fn project(requirements: Option<&str>) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    if let Some(text) = requirements {
        fs::write(dir.path().join("src/requirements.txt"), text).unwrap();
    }
    dir
}

fn creator<'a>(registry: &'a FakeRegistry, dir: &TempDir) -> EnvironmentCreator<&'a FakeRegistry> {
    EnvironmentCreator::new(registry, dir.path(), "sales", "sales_dev", "3.8")
}

#[tokio::test]
async fn reuses_project_environment_with_same_requirements() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default().with("sales", &["pandas>=1.3", "kedro==0.18.4"]);

    let name = creator(&registry, &dir).run().await.unwrap();

    assert_eq!(name, "sales");
    assert_eq!(*registry.lookups.lock().unwrap(), ["sales"]);
    assert!(registry.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn falls_back_to_experiment_environment() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default()
        .with("sales", &["kedro==0.18.3"])
        .with("sales_dev", &["kedro==0.18.4", "pandas>=1.3"]);

    let name = creator(&registry, &dir).run().await.unwrap();

    assert_eq!(name, "sales_dev");
    assert_eq!(*registry.lookups.lock().unwrap(), ["sales", "sales_dev"]);
    assert!(registry.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn registers_when_no_environment_matches() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default().with("sales", &["kedro==0.18.4"]);

    let name = creator(&registry, &dir).run().await.unwrap();

    assert_eq!(name, "sales_dev");
    let registered = registry.registered.lock().unwrap().clone();
    let names: Vec<&str> = registered.iter().map(|(name, _)| name.as_str()).collect();
    let mut expected = [AZUREML_ENVIRONMENT_FILENAME, DOCKERFILE_FILENAME, CONDA_FILENAME];
    expected.sort_unstable();
    assert_eq!(names, expected);

    let conda = &registered
        .iter()
        .find(|(name, _)| name == CONDA_FILENAME)
        .unwrap()
        .1;
    assert!(conda.contains("kedro==0.18.4"));
    assert!(conda.contains("python=3.8"));
    assert!(!dir.path().join("environment").exists());
}

#[tokio::test]
async fn spark_projects_get_the_spark_image() {
    let dir = project(Some(REQUIREMENTS));
    fs::create_dir_all(dir.path().join("src/conf/base")).unwrap();
    fs::write(dir.path().join("src/conf/base/spark.yml"), "spark.master: local\n").unwrap();
    let registry = FakeRegistry::default();

    creator(&registry, &dir).run().await.unwrap();

    let registered = registry.registered.lock().unwrap().clone();
    let dockerfile = &registered
        .iter()
        .find(|(name, _)| name == DOCKERFILE_FILENAME)
        .unwrap()
        .1;
    assert!(dockerfile.contains("openjdk-8-jre"));
}

#[tokio::test]
async fn failed_registration_removes_staging_directory() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default().failing(Registration::Fail);

    let err = creator(&registry, &dir).run().await.unwrap_err();

    assert!(matches!(err, DeployError::CommandFailed { status: 1, .. }));
    assert_eq!(registry.registered.lock().unwrap().len(), 3);
    assert!(!dir.path().join("environment").exists());
}

#[tokio::test]
async fn registration_error_wins_over_cleanup_error() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default().failing(Registration::FailAfterRemoving);

    let err = creator(&registry, &dir).run().await.unwrap_err();

    match err {
        DeployError::CommandFailed { stderr, .. } => assert_eq!(stderr, "quota exceeded"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_requirements_file_is_reported() {
    let dir = project(None);
    let registry = FakeRegistry::default();

    let err = creator(&registry, &dir).run().await.unwrap_err();

    assert!(matches!(err, DeployError::Requirements { .. }));
    assert!(registry.lookups.lock().unwrap().is_empty());
}

#[test]
fn runs_on_a_blocking_executor() {
    let dir = project(Some(REQUIREMENTS));
    let registry = FakeRegistry::default().with("sales", &["kedro==0.18.4", "pandas>=1.3"]);

    let name = tokio_test::block_on(creator(&registry, &dir).run()).unwrap();
    assert_eq!(name, "sales");
}
