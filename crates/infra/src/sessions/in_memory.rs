use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use shopgate_core::StoreError;

use super::{Session, SessionRepository};

/// In-memory session table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    inner: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired or not.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::unavailable("session store lock poisoned")
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        let key = session.token.as_str();
        if map.contains_key(key) {
            return Err(StoreError::conflict("token"));
        }
        map.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;
        Ok(map.remove(token).is_some())
    }
}
