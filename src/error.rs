//! HTTP-boundary error handling
//!
//! Only the inbound API produces these, and all of them are client errors.
//! Nothing in the payment pipeline ever surfaces an error to a caller; it
//! logs and degrades instead.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } | AppError::MalformedBody(_) => ErrorCode::ValidationError,
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

/// Standardized error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    /// ISO 8601 timestamp of the error
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.error_code(),
            message: error.user_message(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        tracing::warn!(
            error = %self,
            status = %status_code.as_u16(),
            "Client error occurred"
        );

        let error_response = ErrorResponse::from_app_error(&self);
        (status_code, Json(error_response)).into_response()
    }
}
