//! Role Gate decision.
//!
//! The role embedded in a credential is never trusted here: the current role
//! is re-read from the system of record on every check.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use shopgate_core::{StoreError, UserId};

use crate::{AuthenticatedIdentity, Role};

/// Read-only view of the system of record needed for role re-resolution.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Current stored role of a user, or `None` if the user does not exist.
    async fn current_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError>;
}

#[async_trait]
impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    async fn current_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        (**self).current_role(user_id).await
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleGateRejection {
    /// No identity in the request context (gate composed without authentication).
    #[error("unauthorized")]
    Unauthorized,

    #[error("user not found")]
    UserNotFound,

    #[error("forbidden: role '{required}' required")]
    Forbidden { required: Role },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Admit the request only if the user's stored role equals `required` exactly.
pub async fn authorize_role(
    identity: Option<&AuthenticatedIdentity>,
    required: &Role,
    directory: &dyn UserDirectory,
) -> Result<(), RoleGateRejection> {
    let identity = identity.ok_or(RoleGateRejection::Unauthorized)?;

    let stored = directory
        .current_role(identity.user_id())
        .await?
        .ok_or(RoleGateRejection::UserNotFound)?;

    if &stored != required {
        tracing::debug!(
            user_id = %identity.user_id(),
            claimed = %identity.role(),
            stored = %stored,
            required = %required,
            "stored role does not match"
        );
        return Err(RoleGateRejection::Forbidden {
            required: required.clone(),
        });
    }

    Ok(())
}
