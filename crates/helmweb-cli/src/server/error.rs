//! API errors
//!
//! Every failure answers with
//! `{"success": false, "status": "failed", "category", "msg", "reason"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use helmweb_core::{DeployError, ErrorCategory, OperationKind};
use helmweb_helm::CollaboratorError;

/// Failure body shared by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub status: &'static str,
    pub category: &'static str,
    pub msg: String,
    pub reason: String,
}

impl ErrorResponse {
    fn new(category: &'static str, msg: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            status: "failed",
            category,
            msg: msg.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// A deployment operation failed
    Deploy {
        operation: OperationKind,
        error: DeployError,
    },
    /// 400 - malformed request outside the option bag (e.g. multipart)
    BadRequest(String),
    /// 503 - the collaborator behind this route is not configured
    Unavailable(&'static str),
    /// 502 - a collaborator reported a failure
    Collaborator(CollaboratorError),
    /// 500 - local failure while preparing a request
    Internal(String),
}

impl ApiError {
    pub fn deploy(operation: OperationKind, error: DeployError) -> Self {
        Self::Deploy { operation, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(err: CollaboratorError) -> Self {
        Self::Collaborator(err)
    }
}

/// Status code for a deployment failure
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::ProcessStart => StatusCode::BAD_GATEWAY,
        ErrorCategory::ToolFailure | ErrorCategory::UnknownResponse => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Callers match on these phrases for conflicts
fn conflict_message(operation: OperationKind) -> Option<&'static str> {
    match operation {
        OperationKind::Install | OperationKind::SimulateInstall => {
            Some("application already exists")
        }
        OperationKind::Push => Some("package exist"),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Deploy { operation, error } => {
                let category = error.category();
                let reason = error.to_string();
                let msg = match conflict_message(operation) {
                    Some(msg) if error.is_conflict() => msg.to_string(),
                    _ => reason.clone(),
                };
                (
                    status_for(category),
                    ErrorResponse::new(category.as_str(), msg, reason),
                )
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation", message.clone(), message),
            ),
            ApiError::Unavailable(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(
                    "unavailable",
                    format!("{service} is not configured"),
                    format!("no {service} is wired into this server"),
                ),
            ),
            ApiError::Collaborator(err) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("collaborator", format!("{} failed", err.service), err.to_string()),
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("internal", message.clone(), message),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(status_for(ErrorCategory::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCategory::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCategory::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorCategory::ProcessStart), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorCategory::UnknownResponse),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_message_depends_on_operation() {
        let conflict = || DeployError::Conflict {
            message: "Error: 409: mychart-1.2.0.tgz already exists".to_string(),
        };
        assert_eq!(conflict_message(OperationKind::Push), Some("package exist"));
        assert_eq!(
            conflict_message(OperationKind::Install),
            Some("application already exists")
        );
        assert_eq!(conflict_message(OperationKind::Upgrade), None);

        let response = ApiError::deploy(OperationKind::Upgrade, conflict()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse::new("conflict", "package exist", "mychart-1.2.0.tgz already exists");
        insta::assert_yaml_snapshot!(body, @r"
        success: false
        status: failed
        category: conflict
        msg: package exist
        reason: mychart-1.2.0.tgz already exists
        ");
    }
}
