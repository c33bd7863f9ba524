//! Password hashing capability.
//!
//! Callers only see `hash(password) -> digest` and
//! `verify(digest, password) -> bool`; the digest is an Argon2id PHC string.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// `false` for a wrong password and for an unparseable digest alike.
    fn verify(&self, digest: &str, password: &str) -> bool;

    /// Spend the same work as `verify` when there is no stored digest to
    /// check against. Always `false`.
    fn verify_absent(&self, password: &str) -> bool;
}

#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
    /// Digest under this hasher's own parameters, verified against when the
    /// account does not exist.
    decoy: OnceLock<String>,
}

impl Argon2PasswordHasher {
    /// Argon2id with the crate's default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit memory (KiB) and iteration cost.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: OnceLock::new(),
        })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }

        let mut salt_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(phc.to_string())
    }

    fn verify(&self, digest: &str, password: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn verify_absent(&self, password: &str) -> bool {
        let decoy = self.decoy.get_or_init(|| {
            self.hash("decoy-password").unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build decoy digest");
                String::new()
            })
        });
        std::hint::black_box(self.verify(decoy, password));
        false
    }
}
