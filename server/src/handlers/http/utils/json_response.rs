use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use shared::types::{ErrorResponse, FieldErrors};
use std::convert::Infallible;
use tracing::{debug, error, warn};

use crate::handlers::http::utils::deliver_page::full;

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    deliver_json(json, status)
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(
    error_code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    error!(
        "Delivering error JSON: {} - {} ({})",
        status.as_u16(),
        error_code,
        message
    );

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// 422 carrying per-field messages.
pub fn deliver_validation_errors(errors: FieldErrors) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    warn!("Validation failed on {} field(s)", errors.len());

    deliver_serialized_json(
        &ErrorResponse::with_errors(
            "VALIDATION_FAILED",
            "Bitte überprüfe die markierten Felder",
            errors,
        ),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

/// Delivers a JSON response from raw pre-serialized bytes.
/// Prefer `deliver_serialized_json` when you have a typed value.
pub fn deliver_json<T: Into<Bytes>>(
    json: T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let bytes: Bytes = json.into();

    debug!("Delivering raw JSON response, size: {} bytes", bytes.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(bytes))
        .map_err(|e: http::Error| {
            error!("Failed to build JSON response: {}", e);
            anyhow!("Failed to build JSON response: {}", e)
        })?;

    Ok(response)
}

/// Last-resort 500 used when a handler itself failed. Cannot fail.
pub fn internal_error_response() -> Response<BoxBody<Bytes, Infallible>> {
    let body = r#"{"status":"error","code":"INTERNAL_ERROR","message":"Internal server error"}"#;
    let mut response = Response::new(full(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
