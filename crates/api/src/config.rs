//! Process configuration, read once at startup.
//!
//! The signing key lives here and nowhere else; it is handed to the codec as
//! an immutable value and never re-read from the environment.

use chrono::Duration;
use thiserror::Error;

use shopgate_auth::DEFAULT_CREDENTIAL_TTL_SECS;
use shopgate_infra::DEFAULT_SESSION_TTL_SECS;

const DEV_SIGNING_KEY: &str = "shopgate-dev-signing-key";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SIGNING_KEY is set but empty")]
    EmptySigningKey,

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Account created at startup if no user with that email exists yet.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    signing_key: Vec<u8>,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub credential_ttl: Duration,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    /// Defaults for everything except the key. Storage is in-memory.
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: signing_key.into(),
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            credential_ttl: Duration::seconds(DEFAULT_CREDENTIAL_TTL_SECS),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            cookie_secure: true,
            bootstrap_admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_key = match lookup("JWT_SIGNING_KEY") {
            Some(key) if key.is_empty() => return Err(ConfigError::EmptySigningKey),
            Some(key) => key,
            None => {
                tracing::warn!("JWT_SIGNING_KEY not set; using insecure dev default");
                DEV_SIGNING_KEY.to_string()
            }
        };

        let mut config = Self::new(signing_key.into_bytes());
        config.database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secs) = lookup("CREDENTIAL_TTL_SECS") {
            config.credential_ttl = parse_ttl("CREDENTIAL_TTL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("SESSION_TTL_SECS") {
            config.session_ttl = parse_ttl("SESSION_TTL_SECS", &secs)?;
        }
        if let Some(flag) = lookup("COOKIE_SECURE") {
            config.cookie_secure = parse_flag("COOKIE_SECURE", &flag)?;
        }

        config.bootstrap_admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "ADMIN_EMAIL",
                    reason: "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
                });
            }
        };

        Ok(config)
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("signing_key", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bind_addr", &self.bind_addr)
            .field("credential_ttl", &self.credential_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

/// Upper bound for any configured lifetime: ten years.
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn parse_ttl(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let ttl = match raw.trim().parse::<i64>() {
        Ok(secs) if (1..=MAX_TTL_SECS).contains(&secs) => Duration::try_seconds(secs),
        _ => None,
    };
    ttl.ok_or_else(|| ConfigError::Invalid {
        var,
        reason: format!("expected between 1 and {MAX_TTL_SECS} seconds, got {raw:?}"),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            reason: format!("expected true/false, got {raw:?}"),
        }),
    }
}
