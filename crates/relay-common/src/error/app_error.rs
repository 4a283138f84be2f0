//! Application error types
//!
//! Errors raised while wiring up and running the binaries, plus the JSON
//! body used when a request is refused before reaching a handler.

use serde::Serialize;

use crate::auth::CredentialError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Authentication failed: {0}")]
    Credential(#[from] CredentialError),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Credential(_) => 401,
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => 500,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Credential(e) => e.code(),
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Credential(CredentialError::Expired).status_code(), 401);
        assert_eq!(AppError::Database("refused".to_string()).status_code(), 500);
        assert_eq!(AppError::Config("JWT_SECRET".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Credential(CredentialError::Expired).error_code(),
            "TOKEN_EXPIRED"
        );
        assert_eq!(
            AppError::Credential(CredentialError::BadSignature).error_code(),
            "INVALID_TOKEN"
        );
        assert_eq!(AppError::Config("x".to_string()).error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_error_response() {
        let response = ErrorResponse::from(AppError::Credential(CredentialError::Missing));

        assert_eq!(response.code, CredentialError::Missing.code());
        assert!(response.message.starts_with("Authentication failed"));
        assert!(response.details.is_none());
    }
}
