//! Custom extractors for Axum handlers.
//!
//! Both reject with [`AppError`](crate::errors::AppError), so malformed or invalid bodies
//! answer with the standard error envelope.

pub mod validated_form;
pub mod validated_json;

pub use validated_form::ValidatedForm;
pub use validated_json::ValidatedJson;
