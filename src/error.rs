//! Error types for chacc
//!
//! All modules use `ChaccResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chacc operations
pub type ChaccResult<T> = Result<T, ChaccError>;

/// All errors that can occur in chacc
#[derive(Error, Debug)]
pub enum ChaccError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache store errors
    #[error("Failed to write cache {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Resolver errors
    #[error("Python interpreter not found: {0}")]
    PythonNotFound(String),

    #[error("pip-tools is not installed for {python}")]
    PipToolsNotFound { python: String },

    #[error("Resolution failed for module {module}: {reason}")]
    Resolution { module: String, reason: String },

    #[error("Resolver timed out for module {module} after {secs}s")]
    ResolverTimeout { module: String, secs: u64 },

    #[error("Failed to probe environment: {0}")]
    EnvironmentProbe(String),

    // Installer errors
    #[error("pip install failed: {0}")]
    Install(String),

    #[error("Failed to query installed packages: {0}")]
    PackageQuery(String),

    // Discovery errors
    #[error("Invalid requirements pattern {pattern}: {reason}")]
    DiscoveryPattern { pattern: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // Command outcomes
    #[error("{failed} module(s) failed to resolve")]
    IncompleteResolution { failed: usize },

    #[error("{count} cached package(s) are not installed")]
    MissingPackages { count: usize },

    // General errors
    #[error("{0}")]
    User(String),
}

impl ChaccError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a per-module resolution error
    pub fn resolution(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PythonNotFound(_) => Some("Set resolver.python in the config or put python3 on PATH"),
            Self::PipToolsNotFound { .. } => Some("Run: python -m pip install pip-tools"),
            Self::ResolverTimeout { .. } => Some("Increase resolver.timeout_secs in the config"),
            Self::Cancelled => Some("The cache was left unchanged"),
            Self::IncompleteResolution { .. } => {
                Some("Previous cache entries were kept; rerun with -v for resolver output")
            }
            Self::MissingPackages { .. } => Some("Run: cdm install"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ChaccError::resolution("api", "no matching distribution");
        assert_eq!(
            err.to_string(),
            "Resolution failed for module api: no matching distribution"
        );
    }

    #[test]
    fn error_hint() {
        let err = ChaccError::PipToolsNotFound {
            python: "python3".to_string(),
        };
        assert_eq!(err.hint(), Some("Run: python -m pip install pip-tools"));
        assert!(ChaccError::User("x".to_string()).hint().is_none());
    }

    #[test]
    fn timeout_display_includes_seconds() {
        let err = ChaccError::ResolverTimeout {
            module: "web".to_string(),
            secs: 30,
        };
        assert!(err.to_string().contains("after 30s"));
    }
}
