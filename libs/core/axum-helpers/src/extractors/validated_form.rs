//! `application/x-www-form-urlencoded` counterpart of [`ValidatedJson`](super::ValidatedJson).

use crate::errors::AppError;
use axum::extract::{Form, FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(data) = Form::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedForm(data))
    }
}
