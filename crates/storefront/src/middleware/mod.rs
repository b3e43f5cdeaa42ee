//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//!
//! Protected handlers take the [`RequireSession`] extractor, which runs the
//! session guard against the stored credential.

pub mod auth;
pub mod session;

pub use auth::{AuthRejection, RequireSession};
pub use session::create_session_layer;
