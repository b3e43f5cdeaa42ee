//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::api::ApiClient;
use crate::auth::SessionGuard;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client, the session guard, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    guard: SessionGuard,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, reqwest::Error> {
        let api = ApiClient::new(&config.api)?;
        let guard = SessionGuard::new(config.login_path.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, guard }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the session guard.
    #[must_use]
    pub fn guard(&self) -> &SessionGuard {
        &self.inner.guard
    }
}

impl FromRef<AppState> for SessionGuard {
    fn from_ref(state: &AppState) -> Self {
        state.guard().clone()
    }
}
