//! Authentication Gate decision.
//!
//! Per request: `Unauthenticated -> Verifying -> {Authenticated | Rejected}`.
//! The `Ok`/`Err` of [`authenticate`] are the two terminal states.

use thiserror::Error;

use crate::{AuthenticatedIdentity, CredentialCodec, VerificationError};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    #[error("missing credential")]
    MissingCredential,

    #[error("authorization header is not of the form `Bearer <token>`")]
    MalformedHeader,

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly two space-separated parts with a
/// case-insensitive `bearer` scheme.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, GateRejection> {
    let header = match header {
        None | Some("") => return Err(GateRejection::MissingCredential),
        Some(h) => h,
    };

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(GateRejection::MalformedHeader),
    }
}

/// Run the gate over a raw `Authorization` header value.
pub fn authenticate(
    header: Option<&str>,
    codec: &CredentialCodec,
) -> Result<AuthenticatedIdentity, GateRejection> {
    let token = parse_bearer(header)?;
    let identity = codec.verify(token)?;
    Ok(identity)
}
