//! Per-request context attached by the gate middleware.
//!
//! Token-authenticated routes receive a
//! [`shopgate_auth::AuthenticatedIdentity`] in the request extensions;
//! cookie-authenticated routes receive a [`SessionContext`]. Nothing is
//! stored process-wide.

use shopgate_core::UserId;
use shopgate_infra::Session;

/// Live session resolved from the `session_token` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
