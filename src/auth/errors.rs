//! Authentication error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::jwt::TokenError;

/// Errors from the login/refresh/logout orchestrator.
#[derive(Debug)]
pub enum AuthError {
    /// Login identifier or password mismatch. Deliberately does not say which.
    InvalidCredentials,
    /// Token failed to validate, or the refresh slot no longer matches.
    InvalidToken,
    /// Token issuance failed.
    Issuance(TokenError),
    /// Storage failure.
    Database(sqlx::Error),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid login id or password"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::Issuance(e) => write!(f, "Failed to issue token: {}", e),
            AuthError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

/// Route-guard rejection. The middleware never rejects a request itself;
/// these are produced by the `Actor` family of extractors.
#[derive(Debug)]
pub enum GuardError {
    NotAuthenticated,
    Forbidden,
    Database,
}

impl GuardError {
    fn status_code(&self) -> StatusCode {
        match self {
            GuardError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            GuardError::Forbidden => StatusCode::FORBIDDEN,
            GuardError::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            GuardError::NotAuthenticated => "Not authenticated",
            GuardError::Forbidden => "Insufficient permissions",
            GuardError::Database => "Database error",
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        use axum::Json;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
