use axum::{
    Json,
    extract::{FromRequest, Request},
};
use axum_valid::{Valid, ValidationRejection};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that was both deserialized and validated.
///
/// Malformed bodies and failed checks are rejected as [`AppError::BadRequest`] so they share the
/// `{"message": ...}` shape of every other error.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Json<T>>::from_request(req, state).await {
            Ok(Valid(Json(value))) => Ok(Self(value)),
            Err(ValidationRejection::Valid(errors)) => Err(errors.into()),
            Err(ValidationRejection::Inner(rejection)) => Err(rejection.into()),
        }
    }
}
