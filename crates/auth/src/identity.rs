use serde::Serialize;
use shopgate_core::UserId;

use crate::Role;

/// Identity established by the Authentication Gate for a single request.
///
/// Threaded explicitly through the request (never stored globally) and
/// discarded when the request ends. `role` is the role embedded at issuance;
/// authorization decisions re-resolve it from the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    user_id: UserId,
    role: Role,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}
