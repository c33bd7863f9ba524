//! Service wiring: codec, repositories, session store, and password hashing.
//!
//! Storage is PostgreSQL when `DATABASE_URL` is configured and in-memory
//! otherwise. Handlers only ever see the trait objects.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopgate_auth::{
    Argon2PasswordHasher, CredentialCodec, KeyError, PasswordError, PasswordHasher, Role,
    SigningKey, UserDirectory,
};
use shopgate_core::{Clock, StoreError, SystemClock};
use shopgate_infra::{
    InMemorySessionRepository, InMemoryUserRepository, NewUser, PostgresSessionRepository,
    PostgresUserRepository, SessionRepository, SessionStore, UserRepository, schema,
};

use crate::config::{AppConfig, BootstrapAdmin};
use crate::cookies::CookiePolicy;
use crate::pipeline::{Gates, PipelineError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid signing key: {0}")]
    Key(#[from] KeyError),

    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("bootstrap admin: {0}")]
    Password(#[from] PasswordError),

    #[error("invalid route pipeline: {0}")]
    Pipeline(#[from] PipelineError),
}

#[derive(Clone)]
pub struct AppServices {
    pub codec: CredentialCodec,
    pub users: Arc<dyn UserRepository>,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: SessionStore,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub cookies: CookiePolicy,
}

impl AppServices {
    /// Wire services over the given repositories.
    ///
    /// `users` backs both account management and role re-resolution, so the
    /// role gate always sees the same system of record as the admin routes.
    pub fn new<U>(
        config: &AppConfig,
        users: Arc<U>,
        sessions: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeyError>
    where
        U: UserRepository + UserDirectory + 'static,
    {
        let key = SigningKey::from_secret(config.signing_key())?;
        let codec = CredentialCodec::new(key)
            .with_ttl(config.credential_ttl)
            .with_clock(clock.clone());
        let sessions = SessionStore::new(sessions)
            .with_ttl(config.session_ttl)
            .with_clock(clock.clone());

        Ok(Self {
            codec,
            users: users.clone(),
            directory: users,
            sessions,
            hasher: Arc::new(Argon2PasswordHasher::new()),
            clock,
            cookies: CookiePolicy {
                secure: config.cookie_secure,
            },
        })
    }

    pub fn in_memory(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, KeyError> {
        Self::new(
            config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemorySessionRepository::new()),
            clock,
        )
    }

    pub async fn postgres(
        config: &AppConfig,
        pool: PgPool,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        schema::migrate(&pool).await?;
        let services = Self::new(
            config,
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresSessionRepository::new(pool)),
            clock,
        )?;
        Ok(services)
    }

    /// Services for a configuration, connecting to PostgreSQL if configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let services = match &config.database_url {
            Some(url) => {
                tracing::info!("using postgres storage");
                let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
                Self::postgres(config, pool, clock).await?
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage");
                Self::in_memory(config, clock)?
            }
        };

        if let Some(admin) = &config.bootstrap_admin {
            services.ensure_admin(admin).await?;
        }

        Ok(services)
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn gates(&self) -> Gates {
        Gates {
            codec: self.codec.clone(),
            directory: self.directory.clone(),
            sessions: self.sessions.clone(),
        }
    }

    /// Create the bootstrap admin unless an account with that email exists.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<(), StartupError> {
        if let Some(existing) = self.users.get_by_email(&admin.email).await? {
            tracing::info!(user_id = %existing.id, role = %existing.role, "bootstrap admin already present");
            return Ok(());
        }

        let hashed_password = self.hasher.hash(&admin.password)?;
        let user = self
            .users
            .create(
                NewUser {
                    email: admin.email.clone(),
                    username: admin.username.clone(),
                    hashed_password,
                    role: Role::ADMIN,
                },
                self.clock.now(),
            )
            .await?;
        tracing::info!(user_id = %user.id, "bootstrap admin created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopgate_core::ManualClock;

    fn services() -> AppServices {
        let config = AppConfig::new(b"services-secret".to_vec());
        AppServices::in_memory(&config, Arc::new(ManualClock::starting_now()))
            .unwrap()
            .with_hasher(Arc::new(Argon2PasswordHasher::with_cost(8, 1).unwrap()))
    }

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            email: "root@shop.test".into(),
            username: "root".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let services = services();
        services.ensure_admin(&admin()).await.unwrap();
        services.ensure_admin(&admin()).await.unwrap();

        let user = services
            .users
            .get_by_email("root@shop.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::ADMIN);
        assert!(services.hasher.verify(&user.hashed_password, "hunter2"));
        assert_eq!(services.users.list(0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn directory_and_repository_share_storage() {
        let services = services();
        services.ensure_admin(&admin()).await.unwrap();
        let user = services
            .users
            .get_by_email("root@shop.test")
            .await
            .unwrap()
            .unwrap();

        services
            .users
            .update_role(user.id, Role::USER, services.clock.now())
            .await
            .unwrap();
        assert_eq!(
            services.directory.current_role(user.id).await.unwrap(),
            Some(Role::USER)
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let config = AppConfig::new(Vec::new());
        let err = AppServices::in_memory(&config, Arc::new(SystemClock)).err();
        assert!(matches!(err, Some(KeyError::Empty)));
    }
}
