//! Error types for the helm integration

use thiserror::Error;

/// Failures of a deployment operation; shared with the core crate
pub type HelmError = helmweb_core::DeployError;

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, HelmError>;

/// Runtime configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    // ============ Repository Errors ============
    #[error("Repository already exists: {name}")]
    RepositoryAlreadyExists { name: String },

    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("Invalid repository name: '{name}' - {reason}")]
    InvalidRepositoryName { name: String, reason: String },

    // ============ IO Errors ============
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid repositories file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
