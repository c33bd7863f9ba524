//! Per-route middleware pipelines.
//!
//! A pipeline is an ordered list of [`Stage`]s ending in `Handle`. Stages run
//! in list order; the first rejection stops the chain. Composition is
//! validated when the router is built, so a role check can never be mounted
//! without the authentication stage that supplies its identity.

use std::mem::discriminant;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use thiserror::Error;

use shopgate_auth::{CredentialCodec, Role, UserDirectory};
use shopgate_infra::SessionStore;

use crate::middleware::{self, AuthState, RoleState, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Bearer credential -> `AuthenticatedIdentity`.
    Authenticate,
    /// `session_token` cookie -> `SessionContext`.
    SessionAuthenticate,
    /// Stored role must equal the given role.
    AuthorizeRole(Role),
    /// The route handler.
    Handle,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("AuthorizeRole({0}) must be preceded by Authenticate")]
    RoleWithoutIdentity(Role),

    #[error("Authenticate and SessionAuthenticate are mutually exclusive")]
    MixedAuthentication,

    #[error("stage {0:?} appears more than once")]
    Duplicate(Stage),

    #[error("Handle must be the last stage")]
    HandleNotLast,

    #[error("pipeline has no Handle stage")]
    MissingHandle,
}

/// Everything the gate stages need, cloned into each mounted layer.
#[derive(Clone)]
pub struct Gates {
    pub codec: CredentialCodec,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: SessionStore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn authenticate(self) -> Self {
        self.then(Stage::Authenticate)
    }

    pub fn authenticate_session(self) -> Self {
        self.then(Stage::SessionAuthenticate)
    }

    pub fn authorize_role(self, role: Role) -> Self {
        self.then(Stage::AuthorizeRole(role))
    }

    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Check a complete pipeline (including its trailing `Handle`).
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut authenticated = false;
        let mut session = false;

        for (i, stage) in self.stages.iter().enumerate() {
            let seen_before = self.stages[..i]
                .iter()
                .any(|earlier| discriminant(earlier) == discriminant(stage));
            if seen_before {
                return Err(PipelineError::Duplicate(stage.clone()));
            }

            match stage {
                Stage::Authenticate => authenticated = true,
                Stage::SessionAuthenticate => session = true,
                Stage::AuthorizeRole(role) if !authenticated => {
                    return Err(PipelineError::RoleWithoutIdentity(role.clone()));
                }
                Stage::AuthorizeRole(_) => {}
                Stage::Handle if i + 1 != self.stages.len() => {
                    return Err(PipelineError::HandleNotLast);
                }
                Stage::Handle => {}
            }

            if authenticated && session {
                return Err(PipelineError::MixedAuthentication);
            }
        }

        match self.stages.last() {
            Some(Stage::Handle) => Ok(()),
            _ => Err(PipelineError::MissingHandle),
        }
    }

    /// Terminate the pipeline with `routes` as its `Handle` stage.
    ///
    /// `routes` must contain at least one route.
    pub fn handle(self, routes: Router, gates: &Gates) -> Result<Router, PipelineError> {
        let pipeline = self.then(Stage::Handle);
        pipeline.validate()?;

        // The last layer added runs first, so wrap from the handler outwards.
        let mut router = routes;
        for stage in pipeline.stages.iter().rev() {
            router = match stage {
                Stage::Handle => router,
                Stage::Authenticate => router.route_layer(from_fn_with_state(
                    AuthState {
                        codec: gates.codec.clone(),
                    },
                    middleware::authenticate,
                )),
                Stage::SessionAuthenticate => router.route_layer(from_fn_with_state(
                    SessionState {
                        sessions: gates.sessions.clone(),
                    },
                    middleware::require_session,
                )),
                Stage::AuthorizeRole(role) => router.route_layer(from_fn_with_state(
                    RoleState {
                        directory: gates.directory.clone(),
                        required: role.clone(),
                    },
                    middleware::require_role,
                )),
            };
        }

        Ok(router)
    }
}
