//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Health check
//!
//! # Session
//! GET    /auth/login              - Login step (echoes returnUrl)
//! POST   /auth/session            - Store a bearer credential
//! GET    /auth/session            - Current session state
//! DELETE /auth/session            - Logout
//!
//! # Checkout (requires auth)
//! GET    /addresses               - Saved addresses and initial selection
//! POST   /checkout                - Place a cash order or open a card payment session
//!
//! # Post-payment landing
//! GET    /cart/success            - Success landing (requires auth)
//! GET    /cart/failure            - Failure landing (requires auth)
//! GET    /cart/success/allorders  - Permanent redirect to /cart/success
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response, Uri},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the session routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route(
            "/session",
            get(auth::current_session)
                .post(auth::create_session)
                .delete(auth::delete_session),
        )
}

/// Create the post-payment landing routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/success", get(cart::success))
        .route("/success/allorders", get(cart::legacy_success))
        .route("/failure", get(cart::failure))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(addresses::list))
        .route("/checkout", post(checkout::checkout))
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}

/// Build the full application: routes, session layer, request tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .fallback(not_found)
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
