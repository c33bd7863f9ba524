//! Credential Codec: signed, stateless bearer credentials.
//!
//! Credentials are HS256 JWTs carrying `{sub, role, iat, exp}`. Verification
//! needs no storage round-trip, so a credential cannot be revoked before it
//! expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header};
use thiserror::Error;

use shopgate_core::{Clock, SystemClock, UserId};

use crate::claims::{CredentialClaims, check_expiry};
use crate::{AuthenticatedIdentity, Role};

/// Default credential lifetime: 30 minutes.
pub const DEFAULT_CREDENTIAL_TTL_SECS: i64 = 30 * 60;

/// Algorithms accepted on verification. Anything outside the HMAC family is
/// rejected before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing key must not be empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign credential: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("credential expiry is out of range")]
    ExpiryOutOfRange,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed credential")]
    MalformedCredential,

    #[error("credential signature does not verify")]
    BadSignature,

    #[error("credential has expired")]
    Expired,
}

/// Process-wide symmetric signing key. Immutable once constructed.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &[u8]) -> Result<Self, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Issues and verifies bearer credentials.
///
/// `issue_at`/`verify_at` are pure in `now`; `issue`/`verify` read the injected
/// clock.
#[derive(Clone)]
pub struct CredentialCodec {
    key: Arc<SigningKey>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialCodec {
    pub fn new(key: SigningKey) -> Self {
        Self {
            key: Arc::new(key),
            ttl: Duration::seconds(DEFAULT_CREDENTIAL_TTL_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId, role: &Role) -> Result<String, IssueError> {
        self.issue_at(user_id, role, self.clock.now())
    }

    pub fn issue_at(
        &self,
        user_id: UserId,
        role: &Role,
        now: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(IssueError::ExpiryOutOfRange)?;
        let claims = CredentialClaims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.key.encoding,
        )?;
        Ok(token)
    }

    pub fn verify(&self, credential: &str) -> Result<AuthenticatedIdentity, VerificationError> {
        self.verify_at(credential, self.clock.now())
    }

    /// Verify algorithm, then signature, then expiry (in that order).
    pub fn verify_at(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, VerificationError> {
        let header =
            decode_header(credential).map_err(|_| VerificationError::MalformedCredential)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(VerificationError::MalformedCredential);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<CredentialClaims>(credential, &self.key.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::BadSignature,
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                _ => VerificationError::MalformedCredential,
            })?;
        let claims = data.claims;

        if !check_expiry(&claims, now) {
            return Err(VerificationError::Expired);
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| VerificationError::MalformedCredential)?;
        if claims.role.is_empty() {
            return Err(VerificationError::MalformedCredential);
        }

        Ok(AuthenticatedIdentity::new(user_id, Role::new(claims.role)))
    }
}

impl core::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
