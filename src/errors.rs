// ABOUTME: Unified error handling with typed error codes and HTTP status mapping
// ABOUTME: Defines the NotFound/AlreadyExists/InvalidInput/InvariantViolation/Unauthenticated/Forbidden taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Unified Error Handling
//!
//! Every fallible operation in this crate returns [`AppResult`]. Error codes
//! are machine-distinguishable so callers can map them to user-facing
//! messages and transport status codes without string matching. The crate
//! itself never panics on caller-supplied input; only unrecoverable internal
//! failures (hashing primitive, storage, key source) surface as the opaque
//! internal codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization (1000-1999)
    #[serde(rename = "UNAUTHENTICATED")]
    Unauthenticated = 1000,
    #[serde(rename = "FORBIDDEN")]
    Forbidden = 1001,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,

    // Resource Management (4000-4999)
    #[serde(rename = "NOT_FOUND")]
    NotFound = 4000,
    #[serde(rename = "ALREADY_EXISTS")]
    AlreadyExists = 4001,
    #[serde(rename = "INVARIANT_VIOLATION")]
    InvariantViolation = 4002,
    #[serde(rename = "DEFAULT_CLIENT_PROTECTED")]
    DefaultClientProtected = 4003,
    #[serde(rename = "NO_CLIENT_SECRET")]
    NoClientSecret = 4004,

    // External Services (5000-5999)
    #[serde(rename = "KEY_SOURCE_UNAVAILABLE")]
    KeySourceUnavailable = 5000,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "HASHING_ERROR")]
    HashingError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput | Self::MissingRequiredField => 400,

            // 401 Unauthorized
            Self::Unauthenticated => 401,

            // 403 Forbidden
            Self::Forbidden => 403,

            // 404 Not Found
            Self::NotFound => 404,

            // 409 Conflict
            Self::AlreadyExists
            | Self::InvariantViolation
            | Self::DefaultClientProtected
            | Self::NoClientSecret => 409,

            // 503 Service Unavailable
            Self::KeySourceUnavailable => 503,

            // 500 Internal Server Error
            Self::ConfigError
            | Self::ConfigMissing
            | Self::InternalError
            | Self::DatabaseError
            | Self::HashingError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Authentication is required to access this resource",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::NotFound => "The requested resource was not found",
            Self::AlreadyExists => "A resource with this identifier already exists",
            Self::InvariantViolation => "The operation would violate a protected invariant",
            Self::DefaultClientProtected => "The default client cannot be deleted or downgraded",
            Self::NoClientSecret => "This client is public and never had a secret",
            Self::KeySourceUnavailable => "Token verification keys are currently unavailable",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigMissing => "Required configuration is missing",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Storage operation failed",
            Self::HashingError => "Credential hashing failed",
        }
    }
}

/// Unified error type for the crate
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

/// Convenience constructors for the taxonomy
impl AppError {
    /// No valid principal on the request
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Valid principal, insufficient grant
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Uniqueness constraint violated
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("{} already exists", resource.into()),
        )
    }

    /// Invalid caller-supplied input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Malformed or disallowed redirect URI
    pub fn invalid_redirect_uri(uri: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidInput,
            format!("invalid redirect URI {uri:?}: {reason}"),
        )
    }

    /// Operation would break a protected invariant
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvariantViolation, message)
    }

    /// The bootstrap client is protected from deletion and PKCE downgrade
    pub fn default_client_protected() -> Self {
        Self::new(
            ErrorCode::DefaultClientProtected,
            "default client cannot be deleted",
        )
    }

    /// Public clients never hold a secret
    pub fn no_client_secret(public_id: &str) -> Self {
        Self::new(
            ErrorCode::NoClientSecret,
            format!("client {public_id} is public and has no secret"),
        )
    }

    /// Verification key source failed or budget exhausted
    pub fn key_source(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::KeySourceUnavailable, message)
    }

    /// Configuration value is invalid
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Required configuration variable absent
    pub fn config_missing(variable: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("missing required configuration: {variable}"),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Opaque hashing primitive failure; deliberately detail-free
    pub fn hashing() -> Self {
        Self::new(ErrorCode::HashingError, "hashing failed")
    }
}

/// Conversion from anyhow::Error to AppError
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
        assert_eq!(ErrorCode::Unauthenticated.http_status(), 401);
        assert_eq!(ErrorCode::Forbidden.http_status(), 403);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::DefaultClientProtected.http_status(), 409);
        assert_eq!(ErrorCode::KeySourceUnavailable.http_status(), 503);
        assert_eq!(ErrorCode::HashingError.http_status(), 500);
    }

    #[test]
    fn test_no_secret_distinct_from_not_found() {
        let no_secret = AppError::no_client_secret("cl_abc");
        let missing = AppError::not_found("client");
        assert_ne!(no_secret.code, missing.code);
        assert_eq!(no_secret.code, ErrorCode::NoClientSecret);
    }

    #[test]
    fn test_error_display_includes_message() {
        let err = AppError::invalid_redirect_uri("ftp://a.com", "scheme must be http or https");
        assert!(err.to_string().contains("ftp://a.com"));
    }
}
