//! Integration tests for the FreshCart storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freshcart-integration-tests
//! ```
//!
//! Nothing external is needed: [`FakeBackend`] stands in for the FreshCart
//! REST API on a loopback port, and [`spawn_storefront`] serves the real
//! storefront router against it.
//!
//! # Test Categories
//!
//! - `backend_client` - `ApiClient` against the fake backend
//! - `storefront_flow` - Session, address and checkout routes over HTTP

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use freshcart_storefront::config::{ApiConfig, StorefrontConfig};
use freshcart_storefront::state::AppState;

/// Path prefix the fake backend serves under.
pub const API_PREFIX: &str = "/api/v1";

// =============================================================================
// Credentials
// =============================================================================

/// Build a credential whose claims segment is `claims`.
#[must_use]
pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Build a credential for subject `u1` expiring `secs` from now.
#[must_use]
pub fn token_expiring_in(secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    token_with_claims(&json!({
        "id": "u1",
        "name": "Test Shopper",
        "role": "user",
        "iat": now,
        "exp": now + secs,
    }))
}

// =============================================================================
// Fake backend
// =============================================================================

/// Canned reply for one backend boundary.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, String),
}

impl Reply {
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::Json(StatusCode::OK, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Json(status, body) => (status, Json(body)).into_response(),
            Self::Text(status, body) => (status, body).into_response(),
        }
    }
}

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub token: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Value of query parameter `key`, percent-decoded.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Debug, Clone)]
struct Replies {
    cash_order: Reply,
    checkout_session: Reply,
    addresses: Reply,
}

#[derive(Debug)]
struct BackendState {
    replies: Mutex<Replies>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the FreshCart REST API.
///
/// Serves `POST /orders/{cartId}`, `POST /orders/checkout-session/{cartId}`
/// and `GET /addresses` under [`API_PREFIX`], answering each with a
/// replaceable canned reply and recording every request.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Start the backend on a random loopback port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState {
            replies: Mutex::new(Replies {
                cash_order: Reply::ok(json!({
                    "status": "success",
                    "data": order_json("o1", "u1")
                })),
                checkout_session: Reply::ok(json!({
                    "status": "success",
                    "session": { "url": "https://checkout.stripe.com/c/pay/cs_test_1" }
                })),
                addresses: Reply::ok(json!({ "status": "success", "results": 0, "data": [] })),
            }),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// REST root to configure clients with.
    ///
    /// # Panics
    ///
    /// Never in practice; the address is always a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}{API_PREFIX}/", self.addr)).expect("valid backend url")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn reply_to_cash_order(&self, reply: Reply) {
        lock(&self.state.replies).cash_order = reply;
    }

    pub fn reply_to_checkout_session(&self, reply: Reply) {
        lock(&self.state.replies).checkout_session = reply;
    }

    pub fn reply_to_addresses(&self, reply: Reply) {
        lock(&self.state.replies).addresses = reply;
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    lock(&state.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(String::from),
        token: headers
            .get("token")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).ok(),
    });

    let replies = lock(&state.replies).clone();
    let route = path.strip_prefix(API_PREFIX).unwrap_or(&path);
    let segments: Vec<&str> = route.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::POST, ["orders", "checkout-session", _]) => {
            replies.checkout_session.into_response()
        }
        (Method::POST, ["orders", _]) => replies.cash_order.into_response(),
        (Method::GET, ["addresses"]) => replies.addresses.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "fail", "message": format!("Can't find {route} on this server") })),
        )
            .into_response(),
    }
}

/// A cash order document as the backend returns it.
#[must_use]
pub fn order_json(id: &str, user: &str) -> Value {
    json!({
        "_id": id,
        "user": user,
        "cartItems": [{ "_id": "l1", "count": 2, "product": "p1", "price": 125 }],
        "shippingAddress": { "details": "12 Main St", "phone": "0100000000", "city": "Cairo" },
        "totalOrderPrice": 250,
        "paymentMethodType": "cash",
        "isPaid": false,
        "isDelivered": false,
        "createdAt": "2024-03-08T10:00:00.000Z",
        "updatedAt": "2024-03-08T10:00:00.000Z"
    })
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront configuration pointing at `backend`.
#[must_use]
pub fn storefront_config(backend: &FakeBackend) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("loopback address"),
        port: 0,
        base_url: Url::parse("http://localhost:3000").expect("storefront url"),
        login_path: "/auth/login".to_string(),
        api: backend.api_config(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Serve the storefront against `backend` and return its root URL.
///
/// # Panics
///
/// Panics if the state cannot be built or the listener cannot be bound.
pub async fn spawn_storefront(backend: &FakeBackend) -> String {
    let state = AppState::new(storefront_config(backend)).expect("storefront state");
    let app = freshcart_storefront::routes::app(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind storefront");
    let addr = listener.local_addr().expect("storefront address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}
