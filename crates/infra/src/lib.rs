//! Infrastructure layer: the system of record for users and sessions.
//!
//! Every repository has an in-memory implementation (dev/tests) and a
//! PostgreSQL implementation. In-process locks are never held across an
//! `.await`.

pub mod schema;
pub mod sessions;
pub mod users;

pub use sessions::{
    DEFAULT_SESSION_TTL_SECS, DeleteOutcome, InMemorySessionRepository,
    PostgresSessionRepository, Session, SessionRepository, SessionStore, SessionStoreError,
    SessionToken,
};
pub use users::{
    InMemoryUserRepository, NewUser, PostgresUserRepository, UserRecord, UserRepository,
};

/// Map a sqlx error into the store taxonomy, naming unique violations by the
/// column they protect.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> shopgate_core::StoreError {
    use shopgate_core::StoreError;

    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let what = match db.constraint() {
                Some("users_email_key") => "email",
                Some("users_username_key") => "username",
                Some("sessions_token_key") | Some("sessions_pkey") => "token",
                Some(other) => other,
                None => "unique constraint",
            };
            return StoreError::conflict(what);
        }
    }
    StoreError::unavailable(err.to_string())
}
