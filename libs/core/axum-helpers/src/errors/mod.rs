pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// {
///   "code": 1006,
///   "error": "CONFLICT",
///   "message": "Event already exists in system"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details (e.g. validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
///
/// Domain crates convert their own error enums into this type so every endpoint
/// answers with the same envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Form extraction error: {0}")]
    FormRejection(#[from] FormRejection),

    #[error("Query extraction error: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// 401 with `WWW-Authenticate: Bearer`
    #[error("Unauthorized: {message}")]
    Unauthorized { code: ErrorCode, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An upstream call or the request itself ran past its deadline (408)
    #[error("Request Timeout: {message}")]
    Timeout { code: ErrorCode, message: String },

    #[error("Too Many Requests")]
    TooManyRequests,

    /// An upstream dependency failed; the message is passed through (500)
    #[error("Upstream error: {message}")]
    Upstream { code: ErrorCode, message: String },

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: ErrorCode::Unauthorized,
            message: message.into(),
        }
    }

    /// Status code this error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SerdeJson(_) | Self::InternalServerError(_) | Self::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Database(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            Self::Database(DbErr::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::JsonExtractorRejection(e) => e.status(),
            Self::FormRejection(e) => e.status(),
            Self::QueryRejection(e) => e.status(),
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn into_parts(self) -> (ErrorCode, String, Option<serde_json::Value>) {
        match self {
            Self::SerdeJson(e) => {
                tracing::error!(error = %e, "JSON serialization failed");
                plain(ErrorCode::SerdeJsonError)
            }
            Self::Database(e) if is_unique_violation(&e) => {
                tracing::info!(error = %e, "Unique constraint violated");
                plain(ErrorCode::Conflict)
            }
            Self::Database(DbErr::RecordNotFound(what)) => {
                (ErrorCode::NotFound, format!("{} not found", what), None)
            }
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                plain(ErrorCode::DatabaseError)
            }
            Self::JsonExtractorRejection(e) => (ErrorCode::JsonExtraction, e.body_text(), None),
            Self::FormRejection(e) => (ErrorCode::ValidationError, e.body_text(), None),
            Self::QueryRejection(e) => (ErrorCode::ValidationError, e.body_text(), None),
            Self::ValidationError(e) => (
                ErrorCode::ValidationError,
                ErrorCode::ValidationError.default_message().to_string(),
                serde_json::to_value(&e).ok(),
            ),
            Self::BadRequest(msg) => (ErrorCode::ValidationError, msg, None),
            Self::Unauthorized { code, message } => (code, message, None),
            Self::Forbidden(msg) => (ErrorCode::Forbidden, msg, None),
            Self::NotFound(msg) => (ErrorCode::NotFound, msg, None),
            Self::Conflict(msg) => (ErrorCode::Conflict, msg, None),
            Self::Timeout { code, message } => (code, message, None),
            Self::TooManyRequests => plain(ErrorCode::TooManyRequests),
            Self::Upstream { code, message } => {
                tracing::error!(error_code = code.code(), "Upstream failure: {}", message);
                (code, message, None)
            }
            Self::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                (ErrorCode::InternalError, msg, None)
            }
            Self::ServiceUnavailable(msg) => (ErrorCode::ServiceUnavailable, msg, None),
        }
    }
}

fn plain(code: ErrorCode) -> (ErrorCode, String, Option<serde_json::Value>) {
    (code, code.default_message().to_string(), None)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let bearer_challenge = matches!(self, Self::Unauthorized { .. });
        let (code, message, details) = self.into_parts();

        if status.is_client_error() {
            tracing::info!(status = status.as_u16(), error_code = code.code(), "{}", message);
        }

        let mut response = error_response_with_details(status, message, code, details);
        if bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Build an error response outside of [`AppError`], e.g. from middleware.
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    error_response_with_details(status, message, error_code, None)
}

fn error_response_with_details(
    status: StatusCode,
    message: String,
    error_code: ErrorCode,
    details: Option<serde_json::Value>,
) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        details,
    });

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Option<HeaderValue>, Value) {
        let response = err.into_response();
        let status = response.status();
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).cloned();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, challenge, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_envelope() {
        let (status, challenge, body) =
            render(AppError::Conflict("Event already exists in system".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(challenge.is_none());
        assert_eq!(body["code"], 1006);
        assert_eq!(body["error"], "CONFLICT");
        assert_eq!(body["message"], "Event already exists in system");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_carries_bearer_challenge() {
        let (status, challenge, body) = render(AppError::Unauthorized {
            code: ErrorCode::TokenExpired,
            message: "Token has expired".into(),
        })
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenge.unwrap(), "Bearer");
        assert_eq!(body["error"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_timeout_and_upstream_statuses() {
        let (status, _, body) = render(AppError::Timeout {
            code: ErrorCode::BrokerTimeout,
            message: "Kafka timed out".into(),
        })
        .await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "BROKER_TIMEOUT");

        let (status, _, body) = render(AppError::Upstream {
            code: ErrorCode::IdentityProviderError,
            message: "realm not found".into(),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "realm not found");
    }

    #[tokio::test]
    async fn test_too_many_requests() {
        let (status, _, body) = render(AppError::TooManyRequests).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], "Too many requests. Please try again later");
    }

    #[tokio::test]
    async fn test_database_errors_hide_details() {
        let (status, _, body) = render(AppError::Database(DbErr::Custom(
            "password authentication failed".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "A database error occurred");

        let (status, _, _) =
            render(AppError::Database(DbErr::RecordNotFound("Event 4".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_details_are_included() {
        use validator::Validate;

        #[derive(Validate)]
        struct Input {
            #[validate(length(min = 1))]
            name: String,
        }

        let errors = Input {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let (status, _, body) = render(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["name"].is_array());
    }
}
