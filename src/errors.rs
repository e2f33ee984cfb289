// ABOUTME: Unified error handling for the auth core with stable error codes
// ABOUTME: Defines the error taxonomy, HTTP mapping, and JSON response formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sello Sign

//! # Unified Error Handling
//!
//! Centralized error types for the Sello auth core. Every failure a caller can
//! observe carries a stable [`ErrorCode`], a human-readable message, and a
//! deterministic HTTP status. Secrets (passwords, verifiers, client secrets,
//! tokens) never appear in error messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & sessions (1000-1999)
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired = 1002,
    #[serde(rename = "AUTH_REVOKED")]
    AuthRevoked = 1003,
    #[serde(rename = "AUTH_MALFORMED")]
    AuthMalformed = 1004,
    #[serde(rename = "ACCOUNT_LOCKED")]
    AccountLocked = 1005,

    // Registration & input (2000-2999)
    #[serde(rename = "DUPLICATE_IDENTITY")]
    DuplicateIdentity = 2000,
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 2001,

    // Provider authorization handshake (3000-3999)
    #[serde(rename = "PKCE_MISSING")]
    PkceMissing = 3000,
    #[serde(rename = "PKCE_EXPIRED")]
    PkceExpired = 3001,
    #[serde(rename = "STATE_MISMATCH")]
    StateMismatch = 3002,

    // Webhook authentication (4000-4999)
    #[serde(rename = "SIGNATURE_INVALID")]
    SignatureInvalid = 4000,

    // External provider (5000-5999)
    #[serde(rename = "PROVIDER_VALIDATION")]
    ProviderValidation = 5000,
    #[serde(rename = "PROVIDER_UNAVAILABLE")]
    ProviderUnavailable = 5001,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9001,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput | Self::PkceMissing | Self::PkceExpired | Self::StateMismatch => 400,

            // 401 Unauthorized
            Self::AuthRequired
            | Self::AuthInvalid
            | Self::AuthExpired
            | Self::AuthRevoked
            | Self::AuthMalformed
            | Self::SignatureInvalid => 401,

            // 409 Conflict
            Self::DuplicateIdentity => 409,

            // 429 Too Many Requests
            Self::AccountLocked => 429,

            // 400 Bad Request - the provider rejected the grant; retrying the
            // same code cannot succeed, so this is a caller-side failure
            Self::ProviderValidation => 400,

            // 502 Bad Gateway
            Self::ProviderUnavailable => 502,

            // 500 Internal Server Error
            Self::ConfigError | Self::InternalError | Self::StorageError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided credentials are invalid",
            Self::AuthExpired => "The session token has expired",
            Self::AuthRevoked => "The session token has been revoked",
            Self::AuthMalformed => "The session token is malformed",
            Self::AccountLocked => "The account is temporarily locked",
            Self::DuplicateIdentity => "An account with this identity already exists",
            Self::InvalidInput => "The provided input is invalid",
            Self::PkceMissing => "No pending authorization challenge was found",
            Self::PkceExpired => "The authorization challenge has expired",
            Self::StateMismatch => "The authorization state does not match",
            Self::SignatureInvalid => "The webhook signature is invalid",
            Self::ProviderValidation => "The e-signature provider rejected the request",
            Self::ProviderUnavailable => "The e-signature provider is unavailable",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::StorageError => "Storage operation failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
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
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
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

/// Convenience functions for creating common errors
impl AppError {
    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid credentials or token. The message is deliberately generic so an
    /// unknown username is indistinguishable from a wrong password.
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Session token expired
    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(ErrorCode::AuthExpired, "Session token has expired")
    }

    /// Session token revoked
    #[must_use]
    pub fn auth_revoked() -> Self {
        Self::new(ErrorCode::AuthRevoked, "Session token has been revoked")
    }

    /// Session token malformed
    pub fn auth_malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthMalformed, message)
    }

    /// Account temporarily locked after repeated failures
    #[must_use]
    pub fn account_locked() -> Self {
        Self::new(
            ErrorCode::AccountLocked,
            "Too many failed login attempts, try again later",
        )
    }

    /// Username or email already registered
    pub fn duplicate_identity(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateIdentity, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Provider rejected the grant (bad code, verifier, or refresh token)
    pub fn provider_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderValidation, message)
    }

    /// Provider unreachable, timed out, or returned a server error
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderUnavailable, message)
    }

    /// Webhook signature missing or invalid
    #[must_use]
    pub fn signature_invalid() -> Self {
        Self::new(ErrorCode::SignatureInvalid, "Webhook signature is invalid")
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }
}

/// Conversion from `anyhow::Error` to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthInvalid.http_status(), 401);
        assert_eq!(ErrorCode::AccountLocked.http_status(), 429);
        assert_eq!(ErrorCode::DuplicateIdentity.http_status(), 409);
        assert_eq!(ErrorCode::StateMismatch.http_status(), 400);
        assert_eq!(ErrorCode::ProviderUnavailable.http_status(), 502);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::account_locked();
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ACCOUNT_LOCKED"));
        assert!(json.contains("failed login attempts"));
    }

    #[test]
    fn test_generic_credential_message() {
        let unknown_user = AppError::auth_invalid("Invalid username or password");
        let bad_password = AppError::auth_invalid("Invalid username or password");
        assert_eq!(unknown_user.message, bad_password.message);
        assert_eq!(unknown_user.code, bad_password.code);
    }
}
