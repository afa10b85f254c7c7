//! Failure classification
//!
//! Helm signals conflicts only in its diagnostic text, so the text decides
//! the category. The text itself is kept verbatim.

use crate::error::DeployError;

/// Phrases that mean the target of the operation already exists
const CONFLICT_MARKERS: &[&str] = &[
    "already exists",
    // Chart museum rejects a push of an existing chart version with HTTP 409
    "Error: 409:",
];

/// Map a raw diagnostic onto the error taxonomy
pub fn classify(raw: &str) -> DeployError {
    if is_conflict(raw) {
        DeployError::Conflict {
            message: raw.to_string(),
        }
    } else {
        DeployError::ToolFailure {
            message: raw.to_string(),
        }
    }
}

/// Classify a failed invocation, preferring stderr and falling back to
/// stdout when the tool wrote its complaint there
pub fn classify_output(stdout: &str, stderr: &str) -> DeployError {
    if stderr.trim().is_empty() {
        classify(stdout)
    } else {
        classify(stderr)
    }
}

pub fn is_conflict(raw: &str) -> bool {
    CONFLICT_MARKERS.iter().any(|marker| raw.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_is_conflict() {
        let err = classify("Error: a release named web already exists.\nRun: helm ls --all web");
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Error: a release named web already exists.\nRun: helm ls --all web"
        );
    }

    #[test]
    fn test_push_409_is_conflict() {
        let err = classify("Error: 409: mychart-1.2.0.tgz already exists");
        assert!(err.is_conflict());
        assert!(classify("Error: 409: file exists").is_conflict());
    }

    #[test]
    fn test_everything_else_is_tool_failure() {
        let raw = "Error: failed to download \"stable/nope\"";
        assert_eq!(
            classify(raw),
            DeployError::ToolFailure {
                message: raw.to_string()
            }
        );
    }

    #[test]
    fn test_conflict_marker_is_case_sensitive() {
        // 409 without the Error prefix is not a push rejection
        assert!(!is_conflict("status 409"));
        assert!(!is_conflict("ALREADY EXISTS"));
    }

    #[test]
    fn test_output_prefers_stderr() {
        let err = classify_output("release web already exists", "Error: timed out");
        assert!(!err.is_conflict());

        let err = classify_output("release web already exists", "  \n");
        assert!(err.is_conflict());
    }
}
