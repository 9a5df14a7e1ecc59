// ABOUTME: Unified error handling with stable error codes and HTTP response formatting
// ABOUTME: Defines AppError, the wire-level ErrorResponse shape, and axum integration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! # Unified Error Handling
//!
//! Centralized error types for the relay. Every error carries a stable
//! `ErrorCode` that maps to an HTTP status and serializes into a consistent
//! JSON body, so API clients can branch on `error.code` rather than on
//! message text.

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The presented access token is not known to the registry
    #[serde(rename = "INVALID_TOKEN")]
    InvalidToken,
    /// The access token has been permanently blocked
    #[serde(rename = "KEY_BLOCKED")]
    KeyBlocked,
    /// A required request field is missing
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField,
    /// Configuration error at startup or runtime
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Action processing failed
    #[serde(rename = "PROCESSING_ERROR")]
    ProcessingError,
    /// Catch-all internal error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 403 Forbidden: token-level rejections
            Self::InvalidToken | Self::KeyBlocked => 403,

            // 400 Bad Request
            Self::MissingRequiredField => 400,

            // 500 Internal Server Error
            Self::ConfigError | Self::ProcessingError | Self::InternalError => 500,
        }
    }

    /// Get a user-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidToken => "The provided access token is not valid",
            Self::KeyBlocked => "The access token has been blocked",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ConfigError => "Configuration error encountered",
            Self::ProcessingError => "Action processing failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Stable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional structured context included in the response body
    pub details: serde_json::Value,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Attach structured details to the error
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Unknown access token
    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::InvalidToken, "Invalid access token")
    }

    /// Token already blocked; `reason` and `blocked_at` come from the record
    pub fn key_blocked(reason: Option<&str>, blocked_at: Option<DateTime<Utc>>) -> Self {
        Self::new(ErrorCode::KeyBlocked, "Access token is blocked").with_details(
            serde_json::json!({
                "reason": reason,
                "blocked_at": blocked_at.map(|t| t.to_rfc3339()),
            }),
        )
    }

    /// Token blocked right now because a second operator presented it
    pub fn key_blocked_violation(assigned_operator: &str) -> Self {
        Self::new(
            ErrorCode::KeyBlocked,
            "Access token blocked for multi-operator use",
        )
        .with_details(serde_json::json!({
            "details": format!("Token is bound to operator: {assigned_operator}"),
            "permanent": true,
        }))
    }

    /// Missing required request field
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidToken.http_status(), 403);
        assert_eq!(ErrorCode::KeyBlocked.http_status(), 403);
        assert_eq!(ErrorCode::MissingRequiredField.http_status(), 400);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::key_blocked_violation("operator_a");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("KEY_BLOCKED"));
        assert!(json.contains("operator_a"));
        assert!(json.contains("permanent"));
    }

    #[test]
    fn test_missing_field_message() {
        let error = AppError::missing_field("operator_id");
        assert_eq!(error.code, ErrorCode::MissingRequiredField);
        assert!(error.message.contains("operator_id"));
        assert!(error.details.is_null());
    }
}
