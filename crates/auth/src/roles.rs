use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use shopgate_core::DomainError;

/// Role identifier.
///
/// Roles are disjoint capability sets compared by exact string equality:
/// there is no hierarchy, so `admin` does not satisfy a `user` requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Parse a role that may be assigned to a user account.
    pub fn parse_assignable(name: &str) -> Result<Self, DomainError> {
        match name {
            "admin" => Ok(Self::ADMIN),
            "user" => Ok(Self::USER),
            _ => Err(DomainError::validation("role must be one of: admin, user")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
