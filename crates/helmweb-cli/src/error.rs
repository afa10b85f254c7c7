//! CLI error types with exit code handling
//!
//! Maps deployment and configuration failures to diagnostics and to the
//! process exit codes in [`crate::exit_codes`].

use helmweb_core::{DeployError, ErrorCategory};
use helmweb_helm::ConfigError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A required option is missing or invalid
    #[error("Validation failed: {message}")]
    #[diagnostic(code(helmweb::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The release or chart already exists
    #[error("{message}")]
    #[diagnostic(
        code(helmweb::cli::conflict),
        help("pick another release name or bump the chart version")
    )]
    Conflict { message: String },

    /// Helm failed, or printed something that could not be interpreted
    #[error("Helm error: {message}")]
    #[diagnostic(code(helmweb::cli::helm))]
    Helm { message: String },

    /// Helm could not be started
    #[error("{message}")]
    #[diagnostic(
        code(helmweb::cli::unavailable),
        help("check --helm-binary or the HELM_BINARY environment variable")
    )]
    Unavailable { message: String },

    /// Helm ran out of time
    #[error("{message}")]
    #[diagnostic(
        code(helmweb::cli::timeout),
        help("raise --timeout or HELMWEB_TIMEOUT")
    )]
    Timeout { message: String },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(helmweb::cli::config))]
    Config { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(helmweb::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Conflict { .. } => exit_codes::CONFLICT,
            CliError::Helm { .. } => exit_codes::ERROR,
            CliError::Unavailable { .. } => exit_codes::UNAVAILABLE,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create an IO error carrying the path that failed
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<DeployError> for CliError {
    fn from(err: DeployError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => CliError::Validation {
                message,
                help: Some("run with --help to see the options of this command".to_string()),
            },
            ErrorCategory::Conflict => CliError::Conflict { message },
            ErrorCategory::ToolFailure | ErrorCategory::UnknownResponse => {
                CliError::Helm { message }
            }
            ErrorCategory::ProcessStart => CliError::Unavailable { message },
            ErrorCategory::Timeout => CliError::Timeout { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_errors_map_to_exit_codes() {
        let cases = [
            (DeployError::missing("chartName"), exit_codes::VALIDATION_ERROR),
            (
                DeployError::Conflict {
                    message: "Error: release web already exists".to_string(),
                },
                exit_codes::CONFLICT,
            ),
            (
                DeployError::unknown_response("push", "garbage"),
                exit_codes::ERROR,
            ),
            (
                DeployError::ProcessStart {
                    program: "helm".to_string(),
                    message: "No such file or directory".to_string(),
                },
                exit_codes::UNAVAILABLE,
            ),
            (
                DeployError::Timeout {
                    program: "helm".to_string(),
                    seconds: 600,
                },
                exit_codes::TIMEOUT,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(CliError::from(err.clone()).exit_code(), code, "{err:?}");
        }
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = CliError::from(DeployError::missing("releaseRevision"));
        assert_eq!(err.to_string(), "Validation failed: releaseRevision is required");
    }
}
