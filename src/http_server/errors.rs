//! HTTP error responses
//!
//! Every failure leaves the server as `(StatusCode, Json<ErrorResponse>)`.
//! Internal failures are logged with their detail and answered with a
//! generic message.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use thiserror::Error;

use crate::access::EngineError;
use crate::auth::AuthError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

pub type ApiFailure = (StatusCode, Json<ErrorResponse>);

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Request rejected before it reached the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,
}

fn failure(status: u16, code: &str, message: String) -> ApiFailure {
    let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status_code,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            status: status_code.as_u16(),
        }),
    )
}

pub fn engine_failure(err: EngineError) -> ApiFailure {
    if let EngineError::Internal(detail) = &err {
        tracing::error!(error = %detail, "request failed");
    }
    failure(err.status_code(), err.code(), err.public_message())
}

pub fn auth_failure(err: AuthError) -> ApiFailure {
    if err.is_client_error() {
        failure(err.status_code(), err.code(), err.to_string())
    } else {
        tracing::error!(error = %err, "account request failed");
        failure(err.status_code(), err.code(), INTERNAL_MESSAGE.to_string())
    }
}

pub fn request_failure(err: RequestError) -> ApiFailure {
    match err {
        RequestError::BadRequest(message) => failure(400, "BAD_REQUEST", message),
        RequestError::PayloadTooLarge => {
            failure(413, "PAYLOAD_TOO_LARGE", RequestError::PayloadTooLarge.to_string())
        }
    }
}

/// Failure of the blocking task itself (panic or cancellation)
pub fn join_failure(err: tokio::task::JoinError) -> ApiFailure {
    tracing::error!(error = %err, "engine task failed");
    failure(500, "INTERNAL_ERROR", INTERNAL_MESSAGE.to_string())
}
