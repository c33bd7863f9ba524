//! User records in the system of record.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use shopgate_auth::Role;
use shopgate_core::{StoreError, UserId};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for account creation. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
}

/// User persistence.
///
/// Duplicate email/username are reported as `StoreError::Conflict("email")`
/// and `StoreError::Conflict("username")`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<UserRecord, StoreError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Users ordered by id.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<UserRecord>, StoreError>;

    /// Returns the updated record, or `None` if the user does not exist.
    async fn update_role(
        &self,
        id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError>;
}
