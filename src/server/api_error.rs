//! Standardized API error responses.
//!
//! All error responses follow this JSON structure:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "LICENSE_NOT_FOUND",
//!     "message": "License is not valid"
//!   }
//! }
//! ```
//!
//! The `details` field is optional and may contain additional context.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::LicenseError;

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === License State Errors (4xx) ===
    /// License key was never issued
    LicenseNotFound,
    /// License existed but its expiry has passed
    LicenseExpired,

    // === Validation Errors (400) ===
    /// Request payload is invalid or malformed
    InvalidRequest,
    /// A required field is missing
    MissingField,
    /// Duration specification could not be parsed
    InvalidDuration,

    // === Server Errors (5xx) ===
    /// License file could not be read or written
    StorageError,
    /// Server configuration error
    ConfigError,
    /// Unexpected internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::MissingField | ErrorCode::InvalidDuration => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::LicenseExpired => StatusCode::FORBIDDEN,
            ErrorCode::LicenseNotFound => StatusCode::NOT_FOUND,
            ErrorCode::StorageError | ErrorCode::ConfigError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a default human-readable message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::LicenseNotFound => "License is not valid",
            ErrorCode::LicenseExpired => "License has expired",
            ErrorCode::InvalidRequest => "Request payload is invalid",
            ErrorCode::MissingField => "A required field is missing",
            ErrorCode::InvalidDuration => "Invalid duration",
            ErrorCode::StorageError => "License storage failed",
            ErrorCode::ConfigError => "Server configuration error",
            ErrorCode::InternalError => "An unexpected error occurred",
        }
    }
}

/// The inner error object containing code, message, and optional details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Top-level error response returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

impl ApiError {
    /// Creates a new API error with the default message for `code`.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: code.default_message().to_string(),
                details: None,
            },
        }
    }

    /// Creates a new API error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    /// Creates a new API error with a custom message and details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.error.code.status_code()
    }

    // === Convenience constructors for common errors ===

    pub fn license_not_found() -> Self {
        Self::new(ErrorCode::LicenseNotFound)
    }

    pub fn license_expired() -> Self {
        Self::new(ErrorCode::LicenseExpired)
    }

    /// Missing required field error.
    pub fn missing_field(field: &str, message: &str) -> Self {
        Self::with_details(
            ErrorCode::MissingField,
            message,
            serde_json::json!({ "field": field }),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::InvalidRequest(msg) => {
                ApiError::with_message(ErrorCode::InvalidRequest, msg)
            }
            LicenseError::InvalidDuration(msg) => {
                ApiError::with_message(ErrorCode::InvalidDuration, msg)
            }
            LicenseError::StorageError(e) => {
                ApiError::with_message(ErrorCode::StorageError, e.to_string())
            }
            LicenseError::SerializationError(e) => {
                ApiError::with_message(ErrorCode::StorageError, e.to_string())
            }
            LicenseError::ConfigError(msg) => ApiError::with_message(ErrorCode::ConfigError, msg),
            LicenseError::ServerError(msg) => {
                ApiError::with_message(ErrorCode::InternalError, msg)
            }
        }
    }
}
