//! Axum adapters for the gates.
//!
//! Each function here is a `from_fn_with_state` middleware. On success the
//! resolved context is inserted into the request extensions and the next
//! stage runs; on failure the chain stops with the rendered rejection.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use shopgate_auth::{
    AuthFailure, AuthenticatedIdentity, CredentialCodec, GateRejection, Role, UserDirectory,
    authorize_role,
};
use shopgate_infra::SessionStore;

use crate::app::errors;
use crate::context::SessionContext;
use crate::cookies::{self, SESSION_COOKIE};

#[derive(Clone)]
pub struct AuthState {
    pub codec: CredentialCodec,
}

#[derive(Clone)]
pub struct RoleState {
    pub directory: Arc<dyn UserDirectory>,
    pub required: Role,
}

#[derive(Clone)]
pub struct SessionState {
    pub sessions: SessionStore,
}

pub async fn authenticate(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let outcome = authorization_header(req.headers())
        .and_then(|header| shopgate_auth::authenticate(header, &state.codec));

    match outcome {
        Ok(identity) => {
            tracing::debug!(user_id = %identity.user_id(), "authenticated");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(rejection) => errors::reject(rejection.into()),
    }
}

pub async fn require_role(State(state): State<RoleState>, req: Request, next: Next) -> Response {
    // Owned copy: the request body is not `Sync`, so no borrow of it may
    // live across the directory lookup.
    let identity = req.extensions().get::<AuthenticatedIdentity>().cloned();

    let decision = authorize_role(identity.as_ref(), &state.required, state.directory.as_ref()).await;

    match decision {
        Ok(()) => next.run(req).await,
        Err(rejection) => errors::reject(AuthFailure::from(&rejection)),
    }
}

pub async fn require_session(
    State(state): State<SessionState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = cookies::read(req.headers(), SESSION_COOKIE) else {
        return errors::reject(AuthFailure::MissingCredential);
    };

    match state.sessions.fetch(&token).await {
        Ok(session) => {
            req.extensions_mut().insert(SessionContext::new(session));
            next.run(req).await
        }
        Err(e) => errors::reject(AuthFailure::from(&e)),
    }
}

/// Raw `Authorization` value. A value that is not visible ASCII cannot be a
/// bearer header.
pub(crate) fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, GateRejection> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| GateRejection::MalformedHeader),
    }
}
