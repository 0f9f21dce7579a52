//! Azure Blob Gen2 credentials in the project's `credentials.yml` files.
//!
//! The shared `base` level holds the datastore and the service principal
//! placeholders; the `local` level only the account.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::DeployResult;

/// File name of the credentials file at each configuration level.
pub const CREDENTIALS_FILENAME: &str = "credentials.yml";

/// A storage credential to add to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Credential name, any identifier the project chooses.
    pub name: String,
    /// Datastore to read the credentials from.
    pub datastore: String,
    /// Storage account name.
    pub account: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Base,
    Local,
}

impl Level {
    fn dir(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Local => "local",
        }
    }
}

/// Merge `request` into `<conf_root>/{base,local}/credentials.yml`.
///
/// Existing keys are preserved. A file that is missing or does not hold
/// an `azure.storage` mapping starts over from an empty one.
/// Returns the written paths.
pub fn create_credential(conf_root: &Path, request: &CredentialRequest) -> DeployResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(2);

    for level in [Level::Base, Level::Local] {
        let path = conf_root.join(level.dir()).join(CREDENTIALS_FILENAME);
        let mut credentials = read_credentials(&path);

        if let Some(storage) = storage_mut(&mut credentials) {
            storage.insert(
                Value::from(request.name.as_str()),
                credential_entry(level, request),
            );
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_yaml::to_string(&credentials)?)?;
        tracing::info!(path = %path.display(), credential = %request.name, "Updated credentials");
        written.push(path);
    }

    Ok(written)
}

fn read_credentials(path: &Path) -> Value {
    let parsed = fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_yaml::from_str::<Value>(&text).ok());

    if let Some(mut value) = parsed {
        if storage_mut(&mut value).is_some() {
            return value;
        }
    }
    tracing::debug!(path = %path.display(), "Starting a new credentials file");
    empty_credentials()
}

fn empty_credentials() -> Value {
    let mut azure = Mapping::new();
    azure.insert("storage".into(), Value::Mapping(Mapping::new()));
    let mut root = Mapping::new();
    root.insert("azure".into(), Value::Mapping(azure));
    Value::Mapping(root)
}

/// The `azure.storage` mapping, created when absent. `None` when the
/// document has a different shape.
fn storage_mut(value: &mut Value) -> Option<&mut Mapping> {
    let root = value.as_mapping_mut()?;
    let azure = root
        .entry("azure".into())
        .or_insert_with(|| Value::Mapping(Mapping::new()))
        .as_mapping_mut()?;
    azure
        .entry("storage".into())
        .or_insert_with(|| Value::Mapping(Mapping::new()))
        .as_mapping_mut()
}

fn credential_entry(level: Level, request: &CredentialRequest) -> Value {
    let mut credential = Mapping::new();
    credential.insert("account_name".into(), request.account.as_str().into());
    credential.insert("anon".into(), Value::Bool(false));

    let mut entry = Mapping::new();
    if level == Level::Base {
        let upper = request.name.to_uppercase();
        credential.insert("client_id".into(), format!("${{{upper}_CLIENT_ID}}").into());
        credential.insert(
            "client_secret".into(),
            format!("${{{upper}_CLIENT_SECRET}}").into(),
        );
        credential.insert(
            "tenant_id".into(),
            format!("${{{upper}_SUBSCRIPTION_ID}}").into(),
        );
        entry.insert("datastore".into(), request.datastore.as_str().into());
    }
    entry.insert("credential".into(), Value::Mapping(credential));
    Value::Mapping(entry)
}
