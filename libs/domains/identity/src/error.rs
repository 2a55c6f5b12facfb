use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;

/// Identity provider failures, translated at the client boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid credentials - {0}")]
    InvalidCredentials(String),

    /// Refresh token, authorization code or bearer token rejected by the provider
    #[error("{0}")]
    InvalidToken(String),

    #[error("Token is not active")]
    InactiveToken,

    #[error("Username already exists")]
    UserExists,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Authorization code not found")]
    MissingCode,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Keycloak did not respond in time - {0}")]
    Timeout(String),

    #[error("Connection to Keycloak error - {0}")]
    Unavailable(String),

    /// Any other non-success answer, with the provider's status and message
    #[error("Keycloak returned {status}: {message}")]
    Provider { status: u16, message: String },
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Provider {
                status: err.status().map(|s| s.as_u16()).unwrap_or(502),
                message: format!("unexpected response body: {}", err),
            }
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        let message = err.to_string();
        match err {
            IdentityError::InvalidCredentials(_) => AppError::Unauthorized {
                code: ErrorCode::InvalidCredentials,
                message,
            },
            IdentityError::InvalidToken(_) | IdentityError::InactiveToken => {
                AppError::Unauthorized {
                    code: ErrorCode::InvalidToken,
                    message,
                }
            }
            IdentityError::UserExists => AppError::Conflict(message),
            IdentityError::UserNotFound(_) => AppError::NotFound(message),
            IdentityError::MissingCode | IdentityError::Validation(_) => {
                AppError::BadRequest(message)
            }
            IdentityError::Timeout(_) => AppError::Timeout {
                code: ErrorCode::IdentityProviderTimeout,
                message,
            },
            IdentityError::Unavailable(_) | IdentityError::Provider { .. } => AppError::Upstream {
                code: ErrorCode::IdentityProviderError,
                message,
            },
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
