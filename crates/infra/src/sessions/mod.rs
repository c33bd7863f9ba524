//! Server-tracked sessions (cookie flow).

mod in_memory;
mod postgres;
mod store;

pub use in_memory::InMemorySessionRepository;
pub use postgres::PostgresSessionRepository;
pub use store::{DEFAULT_SESSION_TTL_SECS, DeleteOutcome, SessionStore, SessionStoreError};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use shopgate_core::{StoreError, UserId};

/// Opaque session token: 32 random bytes, URL-safe base64 (43 chars).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A persisted session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session persistence. Owned exclusively by [`SessionStore`].
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new record; a duplicate token is `StoreError::Conflict("token")`.
    async fn insert(&self, session: &Session) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// `true` if a record was removed.
    async fn delete_by_token(&self, token: &str) -> Result<bool, StoreError>;
}
