//! Bearer credential decoding.
//!
//! Credentials are issued by the backend as three dot-separated segments
//! (`header.claims.signature`). The storefront only ever reads the claims
//! segment and never verifies the signature. Decoding succeeds for any
//! syntactically well-formed token regardless of authenticity.
//!
//! Every failure is absorbed here and reported as a sentinel value:
//! `None` for [`BearerToken::subject_id`], `true` for
//! [`BearerToken::is_expired`], and zero for [`BearerToken::time_remaining`].

use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, TimeZone, Utc};
use freshcart_core::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard alphabet, accepting both padded and unpadded input.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced while reading a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The token is not three segments, or the claims segment is not a
    /// base64url-encoded JSON object.
    #[error("malformed credential: {0}")]
    Malformed(&'static str),

    /// The token decoded but has no expiry or the expiry has passed.
    #[error("credential expired")]
    Expired,
}

/// Claims carried in the middle segment of a credential.
///
/// The backend names the subject field `id`. It is not the registered
/// `sub` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    #[serde(rename = "id", default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Issued-at, seconds since the epoch.
    #[serde(rename = "iat", default)]
    pub issued_at: Option<i64>,
    /// Expiry, seconds since the epoch.
    #[serde(rename = "exp", default)]
    pub expires_at: Option<i64>,
}

impl CredentialClaims {
    /// Expiry as a timestamp, if present and representable.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Whether the claims are expired at `now`.
    ///
    /// Claims without an expiry are treated as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| now.timestamp_millis() >= exp.saturating_mul(1000))
    }

    /// Time left before expiry at `now`, zero if none is left.
    #[must_use]
    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at.map_or(Duration::ZERO, |exp| {
            let remaining = exp
                .saturating_mul(1000)
                .saturating_sub(now.timestamp_millis());
            u64::try_from(remaining).map_or(Duration::ZERO, Duration::from_millis)
        })
    }
}

/// Session view derived from the current credential.
///
/// Never stored: recompute it whenever it is needed so an expiry that
/// elapsed since the credential was stored is observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SessionState {
    Unauthenticated,
    #[serde(rename_all = "camelCase")]
    Authenticated {
        subject: Option<UserId>,
        expires_at: DateTime<Utc>,
    },
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Decode a raw credential into its claims.
///
/// # Errors
///
/// Returns [`CredentialError::Malformed`] unless the token has exactly three
/// segments and the middle one is base64url-encoded JSON object data.
pub fn decode(token: &str) -> Result<CredentialClaims, CredentialError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(claims), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(CredentialError::Malformed("expected three segments"));
    };

    let standard: String = claims
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = CLAIMS_ENGINE
        .decode(standard)
        .map_err(|_| CredentialError::Malformed("claims segment is not base64url"))?;

    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&bytes)
        .map_err(|_| CredentialError::Malformed("claims segment is not a JSON object"))?;

    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|_| CredentialError::Malformed("claims have unexpected types"))
}

/// A bearer credential as stored in the shopper's session.
///
/// The raw token is kept in a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for forwarding to the backend.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Decode the claims segment.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    pub fn decode(&self) -> Result<CredentialClaims, CredentialError> {
        decode(self.expose())
    }

    /// Decode and require the credential to be live at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Malformed`] if decoding fails and
    /// [`CredentialError::Expired`] if the credential is expired.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<CredentialClaims, CredentialError> {
        let claims = self.decode()?;
        if claims.is_expired_at(now) {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }

    /// The backend's subject id, if the token decodes and carries one.
    #[must_use]
    pub fn subject_id(&self) -> Option<UserId> {
        self.decode().ok()?.subject_id.map(UserId::new)
    }

    /// Whether the credential is unusable right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the credential is unusable at `now`.
    ///
    /// True if decoding fails, if there is no expiry claim, or if `now` is at
    /// or past the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.decode().is_ok_and(|claims| !claims.is_expired_at(now))
    }

    /// Time left before the credential expires.
    #[must_use]
    pub fn time_remaining(&self) -> Duration {
        self.time_remaining_at(Utc::now())
    }

    #[must_use]
    pub fn time_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.decode().map_or(Duration::ZERO, |claims| claims.time_remaining_at(now))
    }

    /// Derive the session view right now.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session_state_at(Utc::now())
    }

    /// Derive the session view at `now`.
    #[must_use]
    pub fn session_state_at(&self, now: DateTime<Utc>) -> SessionState {
        let Ok(claims) = self.validate_at(now) else {
            return SessionState::Unauthenticated;
        };
        match claims.expiry() {
            Some(expires_at) => SessionState::Authenticated {
                subject: claims.subject_id.map(UserId::new),
                expires_at,
            },
            None => SessionState::Unauthenticated,
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

impl From<String> for BearerToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}
