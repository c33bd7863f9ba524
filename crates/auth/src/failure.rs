//! Complete authentication/authorization failure taxonomy.
//!
//! Every gate outcome maps to one `AuthFailure`, which is tracked internally
//! with full detail but rendered to callers only by its [`Outcome`] class.

use serde::Serialize;

use crate::{GateRejection, RoleGateRejection, VerificationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    MissingCredential,
    MalformedHeader,
    MalformedCredential,
    BadSignature,
    Expired,
    Unauthorized,
    Forbidden,
    UserNotFound,
    SessionNotFound,
    StoreUnavailable,
}

/// What a caller is allowed to learn about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No valid identity (401).
    Unauthenticated,
    /// Valid identity, insufficient role (403).
    Forbidden,
    /// The system is broken, not the caller (500).
    Internal,
}

impl AuthFailure {
    pub fn outcome(self) -> Outcome {
        match self {
            AuthFailure::Forbidden => Outcome::Forbidden,
            AuthFailure::StoreUnavailable => Outcome::Internal,
            _ => Outcome::Unauthenticated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "missing_credential",
            AuthFailure::MalformedHeader => "malformed_header",
            AuthFailure::MalformedCredential => "malformed_credential",
            AuthFailure::BadSignature => "bad_signature",
            AuthFailure::Expired => "expired",
            AuthFailure::Unauthorized => "unauthorized",
            AuthFailure::Forbidden => "forbidden",
            AuthFailure::UserNotFound => "user_not_found",
            AuthFailure::SessionNotFound => "session_not_found",
            AuthFailure::StoreUnavailable => "store_unavailable",
        }
    }
}

impl core::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VerificationError> for AuthFailure {
    fn from(value: VerificationError) -> Self {
        match value {
            VerificationError::MalformedCredential => AuthFailure::MalformedCredential,
            VerificationError::BadSignature => AuthFailure::BadSignature,
            VerificationError::Expired => AuthFailure::Expired,
        }
    }
}

impl From<GateRejection> for AuthFailure {
    fn from(value: GateRejection) -> Self {
        match value {
            GateRejection::MissingCredential => AuthFailure::MissingCredential,
            GateRejection::MalformedHeader => AuthFailure::MalformedHeader,
            GateRejection::Verification(e) => e.into(),
        }
    }
}

impl From<&RoleGateRejection> for AuthFailure {
    fn from(value: &RoleGateRejection) -> Self {
        match value {
            RoleGateRejection::Unauthorized => AuthFailure::Unauthorized,
            RoleGateRejection::UserNotFound => AuthFailure::UserNotFound,
            RoleGateRejection::Forbidden { .. } => AuthFailure::Forbidden,
            RoleGateRejection::StoreUnavailable(_) => AuthFailure::StoreUnavailable,
        }
    }
}
