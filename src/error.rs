use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// AppError
///
/// Failures on the credential surface (`POST /login`, password hashing, token signing).
/// Resource-level outcomes (not found, not acceptable, unauthorized) are rendered by the
/// resource layer instead and never pass through this type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown user or wrong password. Deliberately does not say which.
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Token lifetime out of range: {0}s")]
    TokenLifetime(i64),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            AppError::TokenLifetime(ttl) => {
                tracing::error!(ttl, "Refusing to sign token with out-of-range lifetime");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
