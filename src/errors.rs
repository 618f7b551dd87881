//! Application error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response_handler::HandlerResponse;

pub const CODE_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CODE_BIND_ERROR: &str = "BIND_ERROR";
pub const CODE_BAD_REQUEST: &str = "BAD_REQUEST";
pub const CODE_RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
pub const CODE_AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";
pub const CODE_OAUTH2_AUTHENTICATION_ERROR: &str = "OAUTH2_AUTHENTICATION_ERROR";
pub const CODE_UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const CODE_INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

pub const MSG_AUTHENTICATION_FAILED: &str = "Invalid email or password.";
pub const MSG_UNAUTHORIZED: &str = "Authentication is required. Please sign in and try again.";
pub const MSG_INTERNAL: &str = "An internal server error occurred.";
pub const MSG_USER_NOT_FOUND: &str = "User not found.";

#[derive(Debug, Error)]
pub enum AppError {
    /// Field validation failed; the payload is the joined `field: message` list
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The body could not be read or deserialised
    #[error("{message}")]
    Bind { status: StatusCode, message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Unknown email, wrong password, or an account without a local password
    #[error("Bad credentials")]
    AuthenticationFailed,

    #[error("{0}")]
    OAuth2(String),

    /// No or invalid access token on a protected route
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn oauth2(message: impl Into<String>) -> Self {
        AppError::OAuth2(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Bind { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthenticationFailed | AppError::OAuth2(_) | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => CODE_VALIDATION_ERROR,
            AppError::Bind { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            AppError::Bind { .. } => CODE_BIND_ERROR,
            AppError::BadRequest(_) => CODE_BAD_REQUEST,
            AppError::NotFound(_) => CODE_RESOURCE_NOT_FOUND,
            AppError::AuthenticationFailed => CODE_AUTHENTICATION_FAILED,
            AppError::OAuth2(_) => CODE_OAUTH2_AUTHENTICATION_ERROR,
            AppError::Unauthorized => CODE_UNAUTHORIZED,
            AppError::Internal(_) => CODE_INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details never leave the service.
    pub fn client_message(&self) -> String {
        match self {
            AppError::AuthenticationFailed => MSG_AUTHENTICATION_FAILED.to_string(),
            AppError::Unauthorized => MSG_UNAUTHORIZED.to_string(),
            AppError::Internal(_) => MSG_INTERNAL.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<AppError> for HandlerResponse {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::Internal(e) => error!("Internal error: {:#}", e),
            AppError::OAuth2(msg) => error!("OAuth2 authentication error: {}", msg),
            other => warn!(code = other.error_code(), "Request failed: {}", other),
        }

        HandlerResponse::failure(err.status_code(), err.client_message(), err.error_code())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        HandlerResponse::from(self).into_response()
    }
}
