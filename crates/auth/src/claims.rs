use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by a bearer credential.
///
/// `sub` is the decimal user id (JWT subjects are strings). `role` is the role
/// at issuance time and is informational only; authorization re-resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub sub: String,
    pub role: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// A credential is live only while `exp` is strictly after `now`.
pub fn check_expiry(claims: &CredentialClaims, now: DateTime<Utc>) -> bool {
    claims.exp > now.timestamp()
}
