//! Cookie-backed sessions.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;

use shopgate_auth::AuthFailure;
use shopgate_infra::DeleteOutcome;

use crate::app::dto::{CredentialsRequest, SessionResponse};
use crate::app::routes::auth::check_credentials;
use crate::app::{errors, services::AppServices};
use crate::context::SessionContext;
use crate::cookies::{self, SESSION_COOKIE};

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::bad_request(rejection.body_text()),
    };

    let user = match check_credentials(&services, req.email, req.password).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let session = match services.sessions.create(user.id).await {
        Ok(session) => session,
        Err(e) => return errors::reject(AuthFailure::from(&e)),
    };

    let cookie = match services
        .cookies
        .session(session.token.as_str(), services.sessions.ttl())
    {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "session token is not a valid cookie value");
            return errors::internal();
        }
    };

    tracing::info!(user_id = %user.id, expires_at = %session.expires_at, "session started");
    (
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(SessionResponse::from(&session)),
    )
        .into_response()
}

pub async fn current(Extension(ctx): Extension<SessionContext>) -> Json<SessionResponse> {
    Json(SessionResponse::from(&ctx))
}

pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = cookies::read(&headers, SESSION_COOKIE) else {
        return errors::reject(AuthFailure::MissingCredential);
    };

    match services.sessions.delete(&token).await {
        Ok(DeleteOutcome::Deleted) => (
            StatusCode::OK,
            [(SET_COOKIE, services.cookies.clear())],
            Json(json!({ "message": "session deleted" })),
        )
            .into_response(),
        Ok(DeleteOutcome::NotFound) => errors::not_found("session not found"),
        Err(e) => errors::store_error(e),
    }
}
