use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shopgate_auth::{Role, UserDirectory};
use shopgate_core::{StoreError, UserId};

use super::{NewUser, UserRecord, UserRepository};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, UserRecord>,
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<State>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::unavailable("user store lock poisoned")
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<UserRecord, StoreError> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::conflict("email"));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::conflict("username"));
        }

        state.next_id += 1;
        let record = UserRecord {
            id: UserId::new(state.next_id),
            email: user.email,
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_role(
        &self,
        id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;
        Ok(state.users.get_mut(&id).map(|user| {
            user.role = role;
            user.updated_at = now;
            user.clone()
        }))
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserRepository {
    async fn current_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        Ok(self.get_by_id(user_id).await?.map(|u| u.role))
    }
}
