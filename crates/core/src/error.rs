//! Error types shared across the capsule crates.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for capsule operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Invalid or incomplete component configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(capsule::config::invalid))]
    Config {
        /// The error message describing the configuration issue
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// A container builder name that is not recognized
    #[error("Unsupported builder: '{builder}' in component '{component}'")]
    #[diagnostic(
        code(capsule::config::builder),
        help("supported builders are 'docker' and 'buildah'")
    )]
    UnsupportedBuilder {
        /// The offending builder value
        builder: String,
        /// The component declaring it
        component: String,
    },

    /// An engine id that matches none of the declared engines
    #[error("Unknown engine id '{id}'. Declared engines: {}", allowed.join(", "))]
    #[diagnostic(code(capsule::config::engine))]
    UnknownEngine {
        /// The requested engine id
        id: String,
        /// Ids of all declared engines
        allowed: Vec<String>,
    },

    /// A setup strategy name that is not recognized for the engine family
    #[error("Unknown setup strategy '{strategy}' in component '{component}'")]
    #[diagnostic(code(capsule::config::strategy))]
    UnknownStrategy {
        /// The offending strategy name
        strategy: String,
        /// The component declaring it
        component: String,
    },

    /// Two engines declared with the same id
    #[error("Duplicate engine id '{id}' in component '{component}'")]
    #[diagnostic(code(capsule::config::engine_id))]
    DuplicateEngineId {
        /// The duplicated id
        id: String,
        /// The component declaring it
        component: String,
    },

    /// A file argument that cannot be resolved to an absolute host path
    #[error("Cannot resolve '{}' to an absolute path: {reason}", path.display())]
    #[diagnostic(code(capsule::mount::path))]
    PathResolution {
        /// The path that failed to resolve
        path: PathBuf,
        /// Why resolution failed
        reason: String,
    },

    /// A build/pull/push action that exited non-zero after all fallbacks
    #[error("Setup action '{action}' failed: {stderr}")]
    #[diagnostic(code(capsule::setup::failed))]
    SetupFailure {
        /// The action that failed
        action: String,
        /// Captured stderr from the external tool
        stderr: String,
    },

    /// A required command missing from the image after setup
    #[error("Required command '{command}' is not present in the image")]
    #[diagnostic(code(capsule::setup::missing_command))]
    MissingCommand {
        /// The missing command
        command: String,
    },

    /// I/O error with operation context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(capsule::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<PathBuf>,
        /// Description of the operation that failed
        operation: String,
    },

    /// Component file could not be parsed
    #[error("Failed to parse component config: {source}")]
    #[diagnostic(code(capsule::config::yaml))]
    Yaml {
        /// The underlying YAML error
        #[from]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// Create a configuration error from a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Wrap an I/O error with operation context.
    #[must_use]
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Io {
            source,
            path,
            operation: operation.into(),
        }
    }

    /// Whether this error is a configuration problem (as opposed to a
    /// runtime failure of an external tool).
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::UnsupportedBuilder { .. }
                | Self::UnknownEngine { .. }
                | Self::UnknownStrategy { .. }
                | Self::DuplicateEngineId { .. }
                | Self::Yaml { .. }
        )
    }
}

/// Result type for capsule operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_builder_names_builder_and_component() {
        let error = Error::UnsupportedBuilder {
            builder: "unsupported_x".to_string(),
            component: "mytool".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("Unsupported builder: 'unsupported_x'"));
        assert!(msg.contains("mytool"));
    }

    #[test]
    fn unknown_engine_lists_allowed_ids() {
        let error = Error::UnknownEngine {
            id: "podman".to_string(),
            allowed: vec!["native".to_string(), "docker".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Unknown engine id 'podman'. Declared engines: native, docker"
        );
    }

    #[test]
    fn config_errors_are_classified() {
        assert!(Error::config("bad").is_config());
        let runtime = Error::SetupFailure {
            action: "pull".to_string(),
            stderr: "no such image".to_string(),
        };
        assert!(!runtime.is_config());
    }
}
