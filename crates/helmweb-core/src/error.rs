//! Error taxonomy for deployment operations

use serde::Serialize;
use thiserror::Error;

/// Every way a deployment operation can fail.
///
/// Variants keep the tool's diagnostic text verbatim; operators read it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("invalid {field} '{value}': expected one of {expected}")]
    InvalidField {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    ToolFailure { message: String },

    #[error("{operation} command returned unknown response: {output}")]
    UnknownResponse { operation: String, output: String },

    #[error("failed to start {program}: {message}")]
    ProcessStart { program: String, message: String },

    #[error("{program} did not finish within {seconds}s and was killed")]
    Timeout { program: String, seconds: u64 },

    #[error("valueFile write failed: {path} -- {message}")]
    ValueFile { path: String, message: String },
}

/// Coarse category of a [`DeployError`], used by outer layers to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Conflict,
    ToolFailure,
    UnknownResponse,
    ProcessStart,
    Timeout,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::ToolFailure => "tool_failure",
            Self::UnknownResponse => "unknown_response",
            Self::ProcessStart => "process_start",
            Self::Timeout => "timeout",
        }
    }
}

impl DeployError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingField { .. } | Self::InvalidField { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            // A value file that cannot be written is a local infrastructure failure
            Self::ToolFailure { .. } | Self::ValueFile { .. } => ErrorCategory::ToolFailure,
            Self::UnknownResponse { .. } => ErrorCategory::UnknownResponse,
            Self::ProcessStart { .. } => ErrorCategory::ProcessStart,
            Self::Timeout { .. } => ErrorCategory::Timeout,
        }
    }

    /// Check if the target of the operation already existed
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this error was raised before any process ran
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Check if re-issuing the same request could succeed without changes.
    ///
    /// Only a timed-out invocation qualifies; conflicts, validation failures
    /// and tool diagnostics repeat deterministically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn unknown_response(operation: impl Into<String>, output: impl Into<String>) -> Self {
        Self::UnknownResponse {
            operation: operation.into(),
            output: output.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
