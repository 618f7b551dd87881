// Unified response system for consistent API responses
// Provides HandlerResponse struct and middleware for standardizing all responses

use anyhow::Context;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, response::Parts, HeaderValue, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::convert::Infallible;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Standard JSON envelope for all API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    #[schema(value_type = Option<Object>)]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Convenience struct for building responses in handlers
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status_code: StatusCode,
    pub data: Value,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

impl HandlerResponse {
    /// Creates a new response with specified status code
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: Value::Null,
            message: None,
            error_code: None,
        }
    }

    /// 200 with a serialisable payload. A payload that fails to serialise is
    /// an internal error, never an empty success.
    pub fn ok<T: Serialize>(data: &T) -> Result<Self, AppError> {
        let data = serde_json::to_value(data).context("Failed to serialize response data")?;
        Ok(Self::new(StatusCode::OK).data(data))
    }

    /// Error response carrying a machine-readable code
    pub fn failure(status_code: StatusCode, message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self::new(status_code)
            .message(message)
            .error_code(error_code)
    }

    /// Adds JSON data payload to the response
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Sets the human-readable message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    fn envelope(&self) -> ApiResponse {
        ApiResponse {
            success: self.status_code.is_success(),
            message: self.message.clone(),
            data: self.data.clone(),
            error_code: self.error_code.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> axum::response::Response {
        let body: Vec<u8> = serde_json::to_vec(&self.envelope()).unwrap_or_else(|_| b"{}".to_vec());

        let mut response: Response<Body> = Response::new(Body::from(body));
        *response.status_mut() = self.status_code;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Store HandlerResponse in extensions for middleware processing
        response.extensions_mut().insert(self);
        response
    }
}

/// Error code for responses produced outside handlers, e.g. "NOT_FOUND"
fn status_error_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_uppercase()
        .replace(' ', "_")
}

/// Two-space indented JSON for debug logs.
fn indented_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut writer: Vec<u8> = Vec::new();
    let mut ser = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"  "));
    value.serialize(&mut ser)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&writer).into_owned())
}

/// Logs the enveloped response at debug level
fn log_formatted_response(status: StatusCode, wrapped: &ApiResponse) {
    match indented_json(wrapped) {
        Ok(spaced_json) => debug!(status = status.as_u16(), "\nFinal response:\n{}", spaced_json),
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Builds the final response with JSON content type
fn build_final_response(parts: Parts, wrapped: &ApiResponse) -> Response<Body> {
    let json_body: Vec<u8> = serde_json::to_vec(wrapped).unwrap_or_else(|_| b"{}".to_vec());
    let mut new_parts: Parts = parts;

    new_parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    new_parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Response::from_parts(new_parts, Body::from(json_body))
}

/// Middleware that makes sure every error leaves the service in the standard
/// envelope. Handler responses are already enveloped; bare error responses
/// (unknown route, wrong method, timeouts, body limits) are wrapped here.
/// Successful non-handler responses such as redirects pass through untouched.
pub async fn response_wrapper(
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, Infallible> {
    let response: Response<Body> = next.run(req).await;

    if let Some(handler_response) = response.extensions().get::<HandlerResponse>() {
        log_formatted_response(response.status(), &handler_response.envelope());
        return Ok(response);
    }

    let status: StatusCode = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }

    let (parts, _) = response.into_parts();

    let wrapped: ApiResponse = ApiResponse {
        success: false,
        message: Some(
            status
                .canonical_reason()
                .unwrap_or("Unexpected error")
                .to_string(),
        ),
        data: Value::Null,
        error_code: Some(status_error_code(status)),
        timestamp: Utc::now(),
    };

    log_formatted_response(status, &wrapped);

    Ok(build_final_response(parts, &wrapped))
}
