// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;

/// API error types
///
/// The auth-flow variants mirror the login handshake failure taxonomy:
/// every one of them is terminal for the request; recovery is the user
/// re-initiating login, never a retry of the failing callback.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
    ValidationError(String),
    /// The `oidc_nonce` cookie was absent or unparsable at callback time.
    InvalidLoginState(String),
    /// The provider redirected back without `code` or `state`.
    MissingAuthorizationCode(String),
    /// Query `state` did not equal the cookie `state` (possible CSRF).
    StateMismatch(String),
    /// Discovery or token exchange failed upstream.
    IdentityProvider(String),
    /// A required ID-token claim (`sub`, `email`) was missing or rejected.
    ClaimsError(String),
    /// An outbound call exceeded its bounded timeout.
    UpstreamTimeout(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::InvalidLoginState(msg) => write!(f, "Invalid Login State: {}", msg),
            ApiError::MissingAuthorizationCode(msg) => {
                write!(f, "Missing Authorization Code: {}", msg)
            }
            ApiError::StateMismatch(msg) => write!(f, "State Mismatch: {}", msg),
            ApiError::IdentityProvider(msg) => write!(f, "Identity Provider Error: {}", msg),
            ApiError::ClaimsError(msg) => write!(f, "Claims Error: {}", msg),
            ApiError::UpstreamTimeout(msg) => write!(f, "Upstream Timeout: {}", msg),
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::InvalidLoginState(msg) => {
                (StatusCode::BAD_REQUEST, msg, "INVALID_LOGIN_STATE")
            }
            ApiError::MissingAuthorizationCode(msg) => {
                (StatusCode::BAD_REQUEST, msg, "MISSING_AUTHORIZATION_CODE")
            }
            ApiError::StateMismatch(msg) => (StatusCode::BAD_REQUEST, msg, "STATE_MISMATCH"),
            ApiError::IdentityProvider(msg) => {
                (StatusCode::BAD_GATEWAY, msg, "IDENTITY_PROVIDER_ERROR")
            }
            ApiError::ClaimsError(msg) => (StatusCode::BAD_REQUEST, msg, "CLAIMS_ERROR"),
            ApiError::UpstreamTimeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, msg, "UPSTREAM_TIMEOUT")
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Helper to convert a failed ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}
