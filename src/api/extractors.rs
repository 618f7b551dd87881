// JSON body extractors that reject with the standard error envelope

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;
use crate::validators::describe_validation_errors;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Bind {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// `Json<T>` followed by `T::validate()`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|errors| AppError::Validation(describe_validation_errors(&errors)))?;
        Ok(Self(value))
    }
}

/// Like `ValidatedJson`, but an empty body yields `None`.
#[derive(Debug, Clone)]
pub struct OptionalJson<T>(pub Option<T>);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Bind {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let value: T = serde_json::from_slice(&bytes).map_err(|err| AppError::Bind {
            status: StatusCode::BAD_REQUEST,
            message: format!("Failed to parse the request body as JSON: {err}"),
        })?;
        value
            .validate()
            .map_err(|errors| AppError::Validation(describe_validation_errors(&errors)))?;
        Ok(Self(Some(value)))
    }
}
