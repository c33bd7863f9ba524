//! `shopgate-core`: shared primitives for the storefront backend.
//!
//! This crate contains no IO, HTTP or storage code.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, StoreError};
pub use id::UserId;
