//! Session-related types.
//!
//! The shopper's bearer credential is the only authentication state the
//! storefront keeps. It is stored as the raw token string and re-validated
//! on every read.

use tower_sessions::Session;

use crate::auth::{BearerToken, CredentialProvider};

/// Session keys for authentication data.
pub mod keys {
    /// Key for the shopper's raw bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";
}

/// Credential read from the shopper's session for one request.
#[derive(Debug, Clone, Default)]
pub struct StoredCredential(pub Option<BearerToken>);

impl StoredCredential {
    /// Read the credential stored in `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let token: Option<String> = session.get(keys::AUTH_TOKEN).await?;
        Ok(Self(token.map(BearerToken::new)))
    }

    /// Store `token` as the shopper's credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn store(
        session: &Session,
        token: &BearerToken,
    ) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::AUTH_TOKEN, token.expose()).await
    }

    /// Drop the shopper's credential (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<String>(keys::AUTH_TOKEN).await?;
        Ok(())
    }
}

impl CredentialProvider for StoredCredential {
    fn credential(&self) -> Option<&BearerToken> {
        self.0.as_ref()
    }
}
