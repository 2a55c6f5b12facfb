use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event '{0}' already exists")]
    Duplicate(String),

    #[error("Event not found: {0}")]
    NotFound(i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown filter field '{0}'")]
    UnknownFilter(String),

    /// The caller's token names no client to own or scope events
    #[error("Token carries no client identifier")]
    MissingClient,

    #[error("Database error: {0}")]
    Database(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<DatabaseError> for EventError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UnknownFilter(field) => Self::UnknownFilter(field),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for EventError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Duplicate(_) => {
                AppError::Conflict("Event already exists in system".to_string())
            }
            EventError::NotFound(id) => AppError::NotFound(format!("Event {} not found", id)),
            EventError::Validation(msg) => AppError::BadRequest(msg),
            err @ EventError::UnknownFilter(_) => AppError::BadRequest(err.to_string()),
            err @ EventError::MissingClient => AppError::unauthorized(err.to_string()),
            EventError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
