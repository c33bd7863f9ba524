//! PostgreSQL-backed session repository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use shopgate_core::{StoreError, UserId};

use super::{Session, SessionRepository, SessionToken};
use crate::map_sqlx_error;

/// Session repository over the `sessions` table (unique `token`).
#[derive(Debug, Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &PgRow) -> Result<Session, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(e.to_string());
    let token: String = row.try_get("token").map_err(corrupt)?;

    Ok(Session {
        token: SessionToken::from(token),
        user_id: UserId::new(row.try_get("user_id").map_err(corrupt)?),
        created_at: row.try_get("created_at").map_err(corrupt)?,
        expires_at: row.try_get("expires_at").map_err(corrupt)?,
    })
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.token.as_str())
        .bind(session.user_id.get())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .as_ref()
        .map(row_to_session)
        .transpose()
    }

    #[tracing::instrument(skip(self, token))]
    async fn delete_by_token(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
