//! Session route handlers.
//!
//! The storefront does not authenticate shoppers itself. The backend issues
//! a bearer credential and the client hands it over here, where it is
//! checked and kept in the shopper's session.

use axum::{
    Json,
    extract::Query,
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::auth::{BearerToken, SessionState};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::session::StoredCredential;

// =============================================================================
// Form Types
// =============================================================================

/// Credential handed over after a backend login.
#[derive(Deserialize)]
pub struct SessionForm {
    pub token: String,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// What the client needs to render the login step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPrompt {
    pub login_required: bool,
    pub return_url: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Store a bearer credential in the session.
///
/// Malformed credentials are rejected with 400 and expired ones with 401.
/// Nothing is stored in either case.
#[instrument(skip(session, form))]
pub async fn create_session(
    session: Session,
    Json(form): Json<SessionForm>,
) -> Result<Json<SessionState>> {
    let token = BearerToken::new(form.token);
    let now = Utc::now();
    let claims = token.validate_at(now)?;

    // New session id on privilege change
    session.cycle_id().await?;
    StoredCredential::store(&session, &token).await?;

    if let Some(subject) = &claims.subject_id {
        set_sentry_user(subject);
    }
    add_breadcrumb("auth", "Session started", None);
    info!(subject = ?claims.subject_id, "shopper session started");

    Ok(Json(token.session_state_at(now)))
}

/// Drop the session credential (logout).
#[instrument(skip(session))]
pub async fn delete_session(session: Session) -> Result<StatusCode> {
    StoredCredential::clear(&session).await?;
    clear_sentry_user();
    add_breadcrumb("auth", "Session ended", None);
    Ok(StatusCode::NO_CONTENT)
}

/// The session as derived from the stored credential right now.
pub async fn current_session(session: Session) -> Result<Json<SessionState>> {
    let stored = StoredCredential::load(&session).await?;
    let state = stored
        .0
        .map_or(SessionState::Unauthenticated, |token| token.session_state());
    Ok(Json(state))
}

/// Login step the session guard redirects to.
///
/// Echoes the return URL so the client can come back after logging in.
/// Only same-origin paths are echoed; anything else falls back to `/`.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPrompt> {
    Json(LoginPrompt {
        login_required: true,
        return_url: local_return_path(query.return_url.as_deref()),
    })
}

fn local_return_path(return_url: Option<&str>) -> String {
    match return_url {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_return_path() {
        assert_eq!(local_return_path(Some("/cart/success")), "/cart/success");
        assert_eq!(local_return_path(Some("/cart/success?x=1")), "/cart/success?x=1");
        assert_eq!(local_return_path(Some("https://evil.example")), "/");
        assert_eq!(local_return_path(Some("//evil.example")), "/");
        assert_eq!(local_return_path(None), "/");
    }
}
