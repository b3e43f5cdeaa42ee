//! Navigation admission for protected destinations.

use serde::Serialize;

use super::credential::BearerToken;

/// Default login destination.
pub const LOGIN_PATH: &str = "/auth/login";

/// Source of the shopper's current credential.
///
/// Implementations read live storage; the guard never caches what they
/// return.
pub trait CredentialProvider {
    /// The stored credential, if any.
    fn credential(&self) -> Option<&BearerToken>;

    /// Whether a credential is present and not expired.
    fn is_authenticated(&self) -> bool {
        self.credential().is_some_and(|token| !token.is_expired())
    }
}

impl CredentialProvider for Option<BearerToken> {
    fn credential(&self) -> Option<&BearerToken> {
        self.as_ref()
    }
}

/// Query carried by a login redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: String,
}

/// Instruction for the navigation layer: go to the login page, then come
/// back to `query.return_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRedirect {
    pub path: String,
    pub query: LoginQuery,
}

impl LoginRedirect {
    /// Render as a relative URI with the return URL percent-encoded.
    #[must_use]
    pub fn to_uri(&self) -> String {
        format!(
            "{}?returnUrl={}",
            self.path,
            urlencoding::encode(&self.query.return_url)
        )
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Deny(LoginRedirect),
}

impl Admission {
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Admission predicate for protected destinations.
///
/// Every call re-derives validity from the provider, so a credential that
/// expires mid-session is caught on the next protected navigation.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    login_path: String,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(LOGIN_PATH)
    }
}

impl SessionGuard {
    #[must_use]
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Decide whether the holder of `provider` may enter `destination`.
    ///
    /// Denials carry a redirect to the login page whose return URL is
    /// `destination`, verbatim.
    #[must_use]
    pub fn check(&self, provider: &impl CredentialProvider, destination: &str) -> Admission {
        if provider.is_authenticated() {
            return Admission::Admit;
        }

        tracing::debug!(destination, "denying unauthenticated navigation");
        Admission::Deny(LoginRedirect {
            path: self.login_path.clone(),
            query: LoginQuery {
                return_url: destination.to_string(),
            },
        })
    }
}
