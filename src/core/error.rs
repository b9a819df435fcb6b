//! Typed error handling at the HTTP boundary
//!
//! Every handler returns `Result<_, ApiError>`. Each variant maps to one HTTP
//! status and one machine-readable code, and is rendered through the uniform
//! envelope:
//!
//! ```json
//! { "success": false, "error": { "message": "...", "code": "..." } }
//! ```
//!
//! Server-side failures (storage, internal) are logged with their detail and
//! answered with a generic message.

use crate::core::auth::AuthError;
use crate::storage::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

const INTERNAL_MESSAGE: &str = "Erreur interne du serveur";

/// The error type returned by every request handler
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed client input
    Validation(String),

    /// Missing, invalid or expired credentials
    Auth(AuthError),

    /// Valid identity with an insufficient role
    Forbidden(String),

    /// Referenced record does not exist
    NotFound(String),

    /// A unique constraint was violated
    Duplicate(String),

    /// A business rule rejected the request
    BadRequest(String),

    /// The client exceeded its request quota
    TooManyRequests(String),

    /// The storage backend cannot be reached
    Unavailable(String),

    /// Storage failure (detail is never sent to the client)
    Storage(StoreError),

    /// Unclassified server failure (detail is never sent to the client)
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Duplicate(msg)
            | ApiError::BadRequest(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Unavailable(msg) => write!(f, "{}", msg),
            ApiError::Auth(e) => write!(f, "{}", e),
            ApiError::Storage(e) => write!(f, "Storage error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Auth(e) => Some(e),
            ApiError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error payload inside the envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: &'static str,
}

/// Uniform error envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        ApiError::Duplicate(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(e) => e.error_code(),
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Duplicate(_) => "DUPLICATE_KEY",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::TooManyRequests(_) => "RATE_LIMITED",
            ApiError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures whose detail stays server-side
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error() && !matches!(self, ApiError::Unavailable(_))
    }

    /// Convert to the client-facing envelope
    pub fn to_response(&self) -> ErrorResponse {
        let message = if self.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        ErrorResponse {
            success: false,
            error: ErrorBody {
                message,
                code: self.error_code(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(self.to_response())).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { field, .. } => {
                ApiError::Duplicate(format!("Un enregistrement avec ce '{}' existe déjà", field))
            }
            StoreError::Unavailable { .. } => {
                tracing::error!(error = %err, "storage unavailable");
                ApiError::Unavailable("Base de données indisponible".to_string())
            }
            other => ApiError::Storage(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

/// Parse a path identifier
pub fn parse_id(raw: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("ID invalide: {}", raw)))
}
