//! Idempotent PostgreSQL schema bootstrap.

use sqlx::PgPool;

use shopgate_core::StoreError;

use crate::map_sqlx_error;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              BIGSERIAL PRIMARY KEY,
        email           TEXT NOT NULL,
        username        TEXT NOT NULL,
        hashed_password TEXT NOT NULL,
        role            TEXT NOT NULL CHECK (role IN ('admin', 'user')),
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_email_key UNIQUE (email),
        CONSTRAINT users_username_key UNIQUE (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token      TEXT NOT NULL,
        user_id    BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT sessions_token_key UNIQUE (token)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions (user_id)",
];

/// Create the `users` and `sessions` tables if they do not exist.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
    }
    tracing::info!("database schema ready");
    Ok(())
}
