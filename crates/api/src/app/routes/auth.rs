//! Registration and credential issuance.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use shopgate_auth::{AuthFailure, Role, authorize_role};
use shopgate_core::{DomainError, StoreError};
use shopgate_infra::{NewUser, UserRecord};

use crate::app::dto::{CredentialsRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::app::{errors, services::AppServices};
use crate::middleware::authorization_header;

const BAD_CREDENTIALS: &str = "incorrect email or password";

pub async fn login(
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

    match services.codec.issue(user.id, &user.role) {
        Ok(token) => {
            tracing::info!(user_id = %user.id, role = %user.role, "credential issued");
            (StatusCode::OK, Json(TokenResponse { token })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to sign credential");
            errors::internal()
        }
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::bad_request(rejection.body_text()),
    };

    let role = match validate_registration(&req) {
        Ok(role) => role,
        Err(e) => return errors::domain_error(e),
    };

    // Only an admin may mint another admin.
    if role == Role::ADMIN {
        if let Err(resp) = require_admin(&services, &headers).await {
            return resp;
        }
    }

    let hasher = services.hasher.clone();
    let password = req.password;
    let hashed_password = match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
        Ok(Ok(digest)) => digest,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::internal();
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            return errors::internal();
        }
    };

    let new_user = NewUser {
        email: req.email.trim().to_string(),
        username: req.username.trim().to_string(),
        hashed_password,
        role,
    };

    match services.users.create(new_user, services.clock.now()).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "user registered");
            (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response()
        }
        Err(StoreError::Conflict(what)) => errors::json_error(
            StatusCode::BAD_REQUEST,
            "conflict",
            format!("{what} already exists"),
        ),
        Err(e) => errors::store_error(e),
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<Role, DomainError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("a valid email is required"));
    }
    if req.username.trim().is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if req.password.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    Role::parse_assignable(&req.role)
}

/// Run both gates inline for the admin-registration path.
async fn require_admin(services: &AppServices, headers: &HeaderMap) -> Result<(), Response> {
    let identity = authorization_header(headers)
        .and_then(|header| shopgate_auth::authenticate(header, &services.codec))
        .map_err(|rejection| errors::reject(rejection.into()))?;

    authorize_role(Some(&identity), &Role::ADMIN, services.directory.as_ref())
        .await
        .map_err(|rejection| errors::reject(AuthFailure::from(&rejection)))?;

    tracing::info!(actor = %identity.user_id(), "admin account registration authorized");
    Ok(())
}

/// Resolve an email/password pair to its stored user.
///
/// Unknown email and wrong password produce the same response.
pub(crate) async fn check_credentials(
    services: &AppServices,
    email: String,
    password: String,
) -> Result<UserRecord, Response> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "email and password are required",
        ));
    }

    let user = services
        .users
        .get_by_email(email)
        .await
        .map_err(errors::store_error)?;

    // Unknown emails still pay for a full verification.
    let hasher = services.hasher.clone();
    let digest = user.as_ref().map(|u| u.hashed_password.clone());
    let matches = tokio::task::spawn_blocking(move || match digest {
        Some(digest) => hasher.verify(&digest, &password),
        None => hasher.verify_absent(&password),
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "password verification task failed");
        errors::internal()
    })?;

    match user {
        Some(user) if matches => Ok(user),
        Some(user) => {
            tracing::debug!(user_id = %user.id, "password mismatch");
            Err(bad_credentials())
        }
        None => {
            tracing::debug!("login for unknown email");
            Err(bad_credentials())
        }
    }
}

fn bad_credentials() -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_credentials", BAD_CREDENTIALS)
}
