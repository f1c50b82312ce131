//! Error handling module for the booking forms backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::booking_api::CollaboratorError;
use crate::validation::{ContactError, ValidationError};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const SUBMISSION_IN_PROGRESS: &str = "SUBMISSION_IN_PROGRESS";
    pub const COLLABORATOR_ERROR: &str = "COLLABORATOR_ERROR";
    pub const CANCELLED: &str = "CANCELLED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// A form field failed validation
    Validation {
        field: Option<&'static str>,
        message: String,
    },
    /// The booking API rejected a duplicate identifier
    Conflict(String),
    /// A submission for this form is already being persisted
    SubmissionInProgress,
    /// The booking API could not be reached or answered with an error
    Collaborator(String),
    /// The form was unmounted while its submission was in flight
    Cancelled,
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            AppError::Cancelled => StatusCode::GONE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation { .. } => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::SubmissionInProgress => codes::SUBMISSION_IN_PROGRESS,
            AppError::Collaborator(_) => codes::COLLABORATOR_ERROR,
            AppError::Cancelled => codes::CANCELLED,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::SubmissionInProgress => {
                "A submission for this form is already in progress".to_string()
            }
            AppError::Collaborator(msg) => msg.clone(),
            AppError::Cancelled => "The form was closed before the booking completed".to_string(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: Some(err.field().as_str()),
            message: err.to_string(),
        }
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        AppError::Validation {
            field: Some(err.field()),
            message: err.to_string(),
        }
    }
}

impl From<CollaboratorError> for AppError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DraftField;

    #[test]
    fn test_validation_error_carries_field() {
        let err: AppError = ValidationError::Telephone.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = ErrorResponse::new(&err);
        assert_eq!(body.error.code, codes::VALIDATION_ERROR);
        assert_eq!(body.error.details.unwrap()["field"], "telephone");
    }

    #[test]
    fn test_collaborator_conflict_maps_to_conflict() {
        let err: AppError = CollaboratorError::Conflict("duplicate id 4".to_string()).into();
        assert_eq!(err.error_code(), codes::CONFLICT);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_collaborator_failure_is_bad_gateway() {
        let err: AppError = CollaboratorError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.message().contains("500"));
    }

    #[test]
    fn test_required_field_error_names_field() {
        let err: AppError = ValidationError::Required(DraftField::Surname).into();
        let body = ErrorResponse::new(&err);
        assert_eq!(body.error.details.unwrap()["field"], "surname");
    }
}
