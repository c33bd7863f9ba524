//! Session Store Adapter.
//!
//! Sole owner of session records. Expired sessions are evicted lazily: the
//! first `fetch` after expiry deletes the record and reports `NotFound`.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;

use shopgate_auth::AuthFailure;
use shopgate_core::{Clock, StoreError, SystemClock, UserId};

use super::{Session, SessionRepository, SessionToken};

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Attempts at allocating an unused token before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session not found")]
    NotFound,

    #[error(transparent)]
    Unavailable(#[from] StoreError),
}

impl From<&SessionStoreError> for AuthFailure {
    fn from(value: &SessionStoreError) -> Self {
        match value {
            SessionStoreError::NotFound => AuthFailure::SessionNotFound,
            SessionStoreError::Unavailable(_) => AuthFailure::StoreUnavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user_id`, expiring `ttl` from now.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, user_id: UserId) -> Result<Session, SessionStoreError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let now = self.clock.now();
            let expires_at = now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| StoreError::unavailable("session expiry is out of range"))?;
            let session = Session {
                token: SessionToken::generate(),
                user_id,
                created_at: now,
                expires_at,
            };

            match self.repo.insert(&session).await {
                Ok(()) => {
                    tracing::debug!(expires_at = %session.expires_at, "session created");
                    return Ok(session);
                }
                Err(StoreError::Conflict(_)) => {
                    tracing::warn!(attempt, "session token collision; regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::unavailable("could not allocate a unique session token").into())
    }

    /// Look up a live session. An expired record is deleted and reported as
    /// `NotFound`.
    #[tracing::instrument(skip(self, token))]
    pub async fn fetch(&self, token: &str) -> Result<Session, SessionStoreError> {
        let session = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or(SessionStoreError::NotFound)?;

        if session.is_expired_at(self.clock.now()) {
            match self.repo.delete_by_token(token).await {
                Ok(_) => tracing::debug!(user_id = %session.user_id, "evicted expired session"),
                // The record stays expired; the next fetch retries the delete.
                Err(e) => tracing::warn!(error = %e, "failed to evict expired session"),
            }
            return Err(SessionStoreError::NotFound);
        }

        Ok(session)
    }

    /// Idempotent: deleting an unknown token reports `NotFound`.
    #[tracing::instrument(skip(self, token))]
    pub async fn delete(&self, token: &str) -> Result<DeleteOutcome, StoreError> {
        if self.repo.delete_by_token(token).await? {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
