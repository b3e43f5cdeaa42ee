//! Session and authorization.
//!
//! - [`credential`] - Bearer credential decoding and expiry checks
//! - [`guard`] - Admission predicate for protected destinations

pub mod credential;
pub mod guard;

pub use credential::{BearerToken, CredentialClaims, CredentialError, SessionState};
pub use guard::{Admission, CredentialProvider, LoginRedirect, SessionGuard};
