// Error types shared by every session-auth crate.
//
// `ApiError` is what leaves the process over HTTP; `AuthError` is the
// internal error every fallible operation returns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable error codes carried in HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FailedToGetSession,
    InvalidConfiguration,
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::FailedToGetSession => "Failed to get session",
            Self::InvalidConfiguration => "Invalid auth configuration",
            Self::InternalServerError => "Internal server error",
        };
        write!(f, "{msg}")
    }
}

/// HTTP status codes used by the API error system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpStatus {
    Unauthorized = 401,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn status_code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

/// Error surfaced to HTTP clients: a status, a code, and a human-readable message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status} {code}: {message}")]
pub struct ApiError {
    pub status: HttpStatus,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: HttpStatus, code: ErrorCode) -> Self {
        Self {
            message: code.to_string(),
            status,
            code,
        }
    }

    pub fn with_message(status: HttpStatus, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn internal(code: ErrorCode) -> Self {
        Self::new(HttpStatus::InternalServerError, code)
    }

    /// Build a JSON body for the error response.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "status": self.status.status_code(),
            }
        })
    }
}

/// Internal error type for option resolution, adapters and callbacks.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A "find first or throw" query matched nothing.
    #[error("No {model} record found")]
    NotFound { model: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Callback error: {0}")]
    Callback(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AuthError {
    pub fn not_found(model: impl Into<String>) -> Self {
        Self::NotFound { model: model.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map to the error reported to HTTP clients.
    ///
    /// A missing record during session resolution is an authentication
    /// failure, not a server fault.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::NotFound { .. } => ApiError::with_message(
                HttpStatus::Unauthorized,
                ErrorCode::FailedToGetSession,
                self.to_string(),
            ),
            Self::Config(msg) => ApiError::with_message(
                HttpStatus::InternalServerError,
                ErrorCode::InvalidConfiguration,
                msg.clone(),
            ),
            Self::Api(api) => api.clone(),
            _ => ApiError::internal(ErrorCode::InternalServerError),
        }
    }
}

/// Unified result type for session-auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
