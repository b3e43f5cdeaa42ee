//! Authentication extractors.
//!
//! [`RequireSession`] admits a request only when the session holds a live
//! bearer credential. The decision is made by the [`SessionGuard`] in
//! application state, against the credential read fresh for this request.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::auth::{Admission, BearerToken, CredentialProvider, LoginRedirect, SessionGuard};
use crate::models::session::StoredCredential;

/// Extractor that requires a live shopper credential.
///
/// If the shopper is not logged in, or the stored credential has expired,
/// the request is redirected to the login page with the requested path as
/// the return URL.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireSession(token): RequireSession) -> impl IntoResponse {
///     let api = state.api().authorized(token);
///     // ...
/// }
/// ```
pub struct RequireSession(pub BearerToken);

/// Error returned when a protected route is requested without a live credential.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin(LoginRedirect),
    /// No session layer ran for this request.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(redirect) => Redirect::to(&redirect.to_uri()).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    SessionGuard: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let stored = StoredCredential::load(session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read session credential");
            StoredCredential::default()
        });

        // Nested routers see a stripped path; the return URL needs the full one.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        let destination = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());

        match SessionGuard::from_ref(state).check(&stored, destination) {
            Admission::Admit => stored
                .credential()
                .cloned()
                .map(Self)
                .ok_or(AuthRejection::Unauthorized),
            Admission::Deny(redirect) => Err(AuthRejection::RedirectToLogin(redirect)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn protected(RequireSession(_): RequireSession) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .nest("/cart", Router::new().route("/failure", get(protected)))
            .route("/addresses", get(protected))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
            .with_state(SessionGuard::new("/auth/login"))
    }

    async fn location(uri: &str) -> String {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers().get(header::LOCATION).unwrap();
        location.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_nested_route_keeps_full_return_path() {
        assert_eq!(
            location("/cart/failure?session_id=cs_9").await,
            "/auth/login?returnUrl=%2Fcart%2Ffailure%3Fsession_id%3Dcs_9"
        );
    }

    #[tokio::test]
    async fn test_top_level_route_return_path() {
        assert_eq!(location("/addresses").await, "/auth/login?returnUrl=%2Faddresses");
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_unauthorized() {
        let app = Router::new()
            .route("/addresses", get(protected))
            .with_state(SessionGuard::new("/auth/login"));
        let response = app
            .oneshot(Request::get("/addresses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
