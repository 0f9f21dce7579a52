//! Configuration error types with actionable user messages.
//!
//! Each variant carries enough context for the user to see what is wrong
//! and which flag, environment variable or file entry fixes it.

use std::fmt;

/// Configuration errors with detailed, actionable messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid configuration value.
    Invalid {
        /// What is wrong.
        message: String,
        /// How to fix it.
        fix_hint: String,
    },
    /// A required setting is missing.
    MissingRequired {
        /// The missing setting name.
        setting: String,
        /// What operation requires this setting.
        context: String,
        /// Flag or environment variable to set.
        set_via: String,
    },
    /// The configuration sources could not be loaded at all.
    Load {
        /// Underlying loader error.
        reason: String,
    },
    /// Multiple errors occurred.
    Multiple(Vec<ConfigurationError>),
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { message, fix_hint } => {
                write!(
                    f,
                    "Invalid configuration: {message}\n\nHow to fix: {fix_hint}"
                )
            }
            Self::MissingRequired {
                setting,
                context,
                set_via,
            } => {
                write!(
                    f,
                    "Missing required configuration: {setting}\n\n\
                    Required for: {context}\n\
                    Set via: {set_via}"
                )
            }
            Self::Load { reason } => write!(f, "Could not load configuration: {reason}"),
            Self::Multiple(errors) => {
                writeln!(f, "Multiple configuration errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "\n{}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl ConfigurationError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(message: impl Into<String>, fix_hint: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            fix_hint: fix_hint.into(),
        }
    }

    /// Create a missing required configuration error.
    #[must_use]
    pub fn missing_required(
        setting: impl Into<String>,
        context: impl Into<String>,
        set_via: impl Into<String>,
    ) -> Self {
        Self::MissingRequired {
            setting: setting.into(),
            context: context.into(),
            set_via: set_via.into(),
        }
    }

    /// Collapse a list of errors: `None` when empty, the error itself when
    /// alone, [`Self::Multiple`] otherwise.
    #[must_use]
    pub fn from_list(mut errors: Vec<ConfigurationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => Some(errors.remove(0)),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Get the number of errors (1 for single errors, N for multiple).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load {
            reason: err.to_string(),
        }
    }
}

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_error_display() {
        let err = ConfigurationError::invalid(
            "python version '3' is not major.minor",
            "Set AZML_PYTHON to a version such as 3.8",
        );
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("major.minor"));
        assert!(msg.contains("How to fix"));
    }

    #[test]
    fn test_missing_required_error_display() {
        let err = ConfigurationError::missing_required(
            "resource group",
            "Calling az ml",
            "--resource-group or AZML_RESOURCE_GROUP",
        );
        let msg = err.to_string();
        assert!(msg.contains("Missing required"));
        assert!(msg.contains("resource group"));
        assert!(msg.contains("AZML_RESOURCE_GROUP"));
    }

    #[test]
    fn test_from_list() {
        assert!(ConfigurationError::from_list(Vec::new()).is_none());

        let single = ConfigurationError::from_list(vec![ConfigurationError::invalid("a", "b")]);
        assert_eq!(single.map(|e| e.count()), Some(1));

        let err = ConfigurationError::from_list(vec![
            ConfigurationError::invalid("Error 1", "Fix 1"),
            ConfigurationError::invalid("Error 2", "Fix 2"),
        ])
        .unwrap();
        let msg = err.to_string();
        assert!(msg.contains("Multiple configuration errors"));
        assert!(msg.contains("1."));
        assert!(msg.contains("2."));
        assert_eq!(err.count(), 2);
    }
}
