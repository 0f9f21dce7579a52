//! `requirements.txt` parsing.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DeployError, DeployResult};

static NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*").ok());

static EGG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"#egg=([A-Za-z0-9][A-Za-z0-9._-]*)").ok());

/// `name[extras] @ url` direct references.
static DIRECT_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(\[[^\]]*\])?\s*@").ok()
});

/// One requirement: the package name and the line as written.
///
/// URL, VCS and path requirements without a recoverable name are keyed by
/// the full line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub line: String,
}

impl Requirement {
    /// Parse one line. `None` for blanks, comments and pip options other
    /// than editable installs.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            return None;
        }

        let source = match editable_source(line) {
            Some(source) => source,
            None if line.starts_with('-') => return None,
            None => line,
        };
        Some(Self {
            name: package_name(source).unwrap_or_else(|| line.to_string()),
            line: line.to_string(),
        })
    }
}

/// Target of a `-e`/`--editable` line.
fn editable_source(line: &str) -> Option<&str> {
    ["--editable", "-e"]
        .iter()
        .find_map(|flag| line.strip_prefix(flag))
        .filter(|rest| rest.starts_with([' ', '\t', '=']))
        .map(|rest| rest.trim_start_matches([' ', '\t', '=']))
}

fn package_name(source: &str) -> Option<String> {
    let capture = |regex: &Option<Regex>| {
        regex
            .as_ref()?
            .captures(source)?
            .get(1)
            .map(|m| m.as_str().to_string())
    };
    if let Some(name) = capture(&EGG).or_else(|| capture(&DIRECT_REFERENCE)) {
        return Some(name);
    }
    if source.contains("://") || source.starts_with(['.', '/', '~']) {
        return None;
    }
    NAME.as_ref()?.find(source).map(|m| m.as_str().to_string())
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Parse requirements text.
///
/// A later line for the same package replaces the earlier one in place.
#[must_use]
pub fn parse_requirements(text: &str) -> Vec<Requirement> {
    let mut requirements: Vec<Requirement> = Vec::new();

    for raw in text.lines() {
        let Some(requirement) = Requirement::parse(raw) else {
            if raw.trim_start().starts_with('-') {
                tracing::debug!(line = %raw.trim(), "Skipping pip option");
            }
            continue;
        };
        match requirements.iter_mut().find(|r| r.name == requirement.name) {
            Some(existing) => *existing = requirement,
            None => requirements.push(requirement),
        }
    }

    requirements
}

/// Read and parse a requirements file.
pub fn read_requirements(path: &Path) -> DeployResult<Vec<Requirement>> {
    let text = std::fs::read_to_string(path).map_err(|e| DeployError::Requirements {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(parse_requirements(&text))
}
