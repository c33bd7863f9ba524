use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopgate_auth::{AuthFailure, Outcome};
use shopgate_core::{DomainError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Render a gate failure by outcome class only.
///
/// Every verification failure and an unknown user look the same to the
/// caller; the detailed reason is logged.
pub fn reject(failure: AuthFailure) -> axum::response::Response {
    match failure.outcome() {
        Outcome::Unauthenticated => {
            tracing::debug!(reason = %failure, "request not authenticated");
            let message = match failure {
                AuthFailure::MissingCredential => "authorization required",
                AuthFailure::MalformedHeader => "invalid token, expects bearer token",
                _ => "unauthorized request",
            };
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        Outcome::Forbidden => {
            tracing::info!(reason = %failure, "request forbidden");
            json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient role")
        }
        Outcome::Internal => {
            tracing::error!(reason = %failure, "authorization could not be evaluated");
            internal()
        }
    }
}

pub fn store_error(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store operation failed");
    internal()
}

pub fn domain_error(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::Conflict(msg) => json_error(StatusCode::BAD_REQUEST, "conflict", msg),
    }
}

pub fn internal() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn not_found(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", message)
}
