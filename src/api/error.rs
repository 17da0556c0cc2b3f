//! Mapping of service errors onto HTTP responses

use crate::error::{FieldIssue, SkeeboardError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// JSON error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        ApiError(error.into())
    }
}

impl ApiError {
    /// Malformed request body
    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        SkeeboardError::invalid_field("body", rejection.body_text()).into()
    }

    /// Malformed query string
    pub fn from_query_rejection(rejection: QueryRejection) -> Self {
        SkeeboardError::invalid_field("query", rejection.body_text()).into()
    }

    fn parts(&self) -> (StatusCode, ErrorBody) {
        let body = |error: &str, message: String, issues: Vec<FieldIssue>| ErrorBody {
            error: error.to_string(),
            message,
            issues,
        };

        match self.0.downcast_ref::<SkeeboardError>() {
            Some(SkeeboardError::Validation { issues }) => (
                StatusCode::BAD_REQUEST,
                body("validation_failed", self.0.to_string(), issues.clone()),
            ),
            Some(SkeeboardError::InvalidInput { reason }) => (
                StatusCode::BAD_REQUEST,
                body(
                    "validation_failed",
                    self.0.to_string(),
                    vec![FieldIssue::new("scores", reason.clone())],
                ),
            ),
            Some(
                error @ (SkeeboardError::PlayerNotFound { .. }
                | SkeeboardError::SessionNotFound { .. }),
            ) => (
                StatusCode::NOT_FOUND,
                body("not_found", error.to_string(), Vec::new()),
            ),
            Some(SkeeboardError::StorageFailure { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body(
                    "storage_failure",
                    "The session could not be stored, please try again".to_string(),
                    Vec::new(),
                ),
            ),
            Some(SkeeboardError::ConfigurationError { .. })
            | Some(SkeeboardError::InternalError { .. })
            | None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body(
                    "internal_error",
                    "An unexpected error occurred".to_string(),
                    Vec::new(),
                ),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            debug!("Request rejected ({}): {}", status, self.0);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_of(error: SkeeboardError) -> (StatusCode, ErrorBody) {
        ApiError::from(error).parts()
    }

    #[test]
    fn test_validation_maps_to_400_with_issues() {
        let (status, body) = parts_of(SkeeboardError::invalid_field(
            "scores[2]",
            "must be a multiple of 10",
        ));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation_failed");
        assert_eq!(body.issues[0].field, "scores[2]");
    }

    #[test]
    fn test_not_found() {
        let (status, body) = parts_of(SkeeboardError::PlayerNotFound {
            player_name: "Nobody".to_string(),
        });

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "not_found");
        assert!(body.message.contains("Nobody"));
    }

    #[test]
    fn test_storage_failure_message_is_generic() {
        let (status, body) = parts_of(SkeeboardError::StorageFailure {
            message: "disk on fire at /var/lib/skeeboard".to_string(),
        });

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "storage_failure");
        assert!(!body.message.contains("/var/lib"));
    }

    #[test]
    fn test_foreign_errors_are_internal() {
        let (status, body) = ApiError::from(anyhow::anyhow!("boom")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
    }
}
