//! `shopgate-auth`: authentication/authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: gates take raw
//! header values and talk to the system of record through the `UserDirectory`
//! port.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod failure;
pub mod gate;
pub mod identity;
pub mod password;
pub mod roles;

pub use authorize::{RoleGateRejection, UserDirectory, authorize_role};
pub use claims::{CredentialClaims, check_expiry};
pub use codec::{
    CredentialCodec, DEFAULT_CREDENTIAL_TTL_SECS, IssueError, KeyError, SigningKey,
    VerificationError,
};
pub use failure::{AuthFailure, Outcome};
pub use gate::{GateRejection, authenticate, parse_bearer};
pub use identity::AuthenticatedIdentity;
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use roles::Role;
