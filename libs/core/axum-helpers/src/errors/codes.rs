//! Type-safe error codes for API responses.
//!
//! Each code has a SCREAMING_SNAKE_CASE identifier for clients, an integer for logs and
//! metrics, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::TokenExpired;
//! assert_eq!(code.as_str(), "TOKEN_EXPIRED");
//! assert_eq!(code.code(), 1102);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    ValidationError,
    InvalidJson,
    JsonExtraction,
    InvalidFilter,
    NotFound,
    Conflict,
    RequestTimeout,
    TooManyRequests,

    // Authentication and authorization (1100s)
    Unauthorized,
    InvalidCredentials,
    TokenExpired,
    InvalidToken,
    InvalidSignature,
    Forbidden,

    // Server errors (1500s)
    InternalError,
    ServiceUnavailable,

    // Database (2000s)
    DatabaseError,

    // Upstream services (3000s)
    IdentityProviderError,
    IdentityProviderTimeout,
    BrokerError,
    BrokerTimeout,

    // Serialization (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InvalidFilter => "INVALID_FILTER",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Forbidden => "FORBIDDEN",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::IdentityProviderError => "IDENTITY_PROVIDER_ERROR",
            Self::IdentityProviderTimeout => "IDENTITY_PROVIDER_TIMEOUT",
            Self::BrokerError => "BROKER_ERROR",
            Self::BrokerTimeout => "BROKER_TIMEOUT",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code used in structured logs.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::JsonExtraction => 1003,
            Self::InvalidFilter => 1004,
            Self::NotFound => 1005,
            Self::Conflict => 1006,
            Self::RequestTimeout => 1007,
            Self::TooManyRequests => 1008,
            Self::Unauthorized => 1101,
            Self::TokenExpired => 1102,
            Self::InvalidToken => 1103,
            Self::InvalidSignature => 1104,
            Self::InvalidCredentials => 1105,
            Self::Forbidden => 1106,
            Self::InternalError => 1500,
            Self::ServiceUnavailable => 1501,
            Self::DatabaseError => 2001,
            Self::IdentityProviderError => 3001,
            Self::IdentityProviderTimeout => 3002,
            Self::BrokerError => 3101,
            Self::BrokerTimeout => 3102,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidJson => "Invalid JSON format",
            Self::JsonExtraction => "Failed to extract JSON from request body",
            Self::InvalidFilter => "Unknown filter field",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::RequestTimeout => "Request timed out",
            Self::TooManyRequests => "Too many requests. Please try again later",
            Self::Unauthorized => "Authentication required",
            Self::TokenExpired => "Token has expired",
            Self::InvalidToken => "Token is malformed or invalid",
            Self::InvalidSignature => "Token signature is invalid",
            Self::InvalidCredentials => "Invalid credentials",
            Self::Forbidden => "Access forbidden",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::DatabaseError => "A database error occurred",
            Self::IdentityProviderError => "Identity provider request failed",
            Self::IdentityProviderTimeout => "Identity provider did not respond in time",
            Self::BrokerError => "Message broker request failed",
            Self::BrokerTimeout => "Message broker did not respond in time",
            Self::SerdeJsonError => "Failed to process JSON data",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
