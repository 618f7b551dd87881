// Global error handling for HTTP middleware layers

use axum::{http::StatusCode, BoxError};
use std::error::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;
// Axum uses http_body_util for length-limiting
use http_body_util::LengthLimitError;

use crate::utils::response_handler::HandlerResponse;

/// Maps errors raised by middleware layers to enveloped HTTP responses
pub async fn handle_global_error(err: BoxError) -> HandlerResponse {
    // 413 if the body was too large
    if err.is::<LengthLimitError>() || find_cause::<LengthLimitError>(&*err).is_some() {
        return HandlerResponse::failure(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
            "PAYLOAD_TOO_LARGE",
        );
    }

    // 408 if the request took too long
    if err.is::<Elapsed>() {
        return HandlerResponse::failure(
            StatusCode::REQUEST_TIMEOUT,
            "Request timed out",
            "REQUEST_TIMEOUT",
        );
    }

    // Otherwise, 500
    tracing::error!("Unhandled middleware error: {}", err);
    HandlerResponse::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal server error occurred.",
        "INTERNAL_SERVER_ERROR",
    )
}

/// Helper function to find specific error type in error chain
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}
