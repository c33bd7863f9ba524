//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use shopgate_auth::{Role, UserDirectory};
use shopgate_core::{StoreError, UserId};

use super::{NewUser, UserRecord, UserRepository};
use crate::map_sqlx_error;

const USER_COLUMNS: &str = "id, email, username, hashed_password, role, created_at, updated_at";

/// User repository over the `users` table.
///
/// The pool is cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> Result<UserRecord, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(e.to_string());
    let role: String = row.try_get("role").map_err(corrupt)?;

    Ok(UserRecord {
        id: UserId::new(row.try_get("id").map_err(corrupt)?),
        email: row.try_get("email").map_err(corrupt)?,
        username: row.try_get("username").map_err(corrupt)?,
        hashed_password: row.try_get("hashed_password").map_err(corrupt)?,
        role: Role::new(role),
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<UserRecord, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, username, hashed_password, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.hashed_password)
            .bind(user.role.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row_to_user(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
    }

    #[tracing::instrument(skip(self, email))]
    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2");
        let rows = sqlx::query(&sql)
            .bind(offset.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_user).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn update_role(
        &self,
        id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query(&sql)
            .bind(id.get())
            .bind(role.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .as_ref()
            .map(row_to_user)
            .transpose()
    }
}

#[async_trait]
impl UserDirectory for PostgresUserRepository {
    async fn current_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(role.map(Role::new))
    }
}
