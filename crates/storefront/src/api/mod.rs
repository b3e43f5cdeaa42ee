//! FreshCart backend REST client.
//!
//! # Boundaries
//!
//! ```text
//! POST /orders/{cartId}                          - create a cash order
//! POST /orders/checkout-session/{cartId}?url=... - open a hosted card payment session
//! GET  /addresses                                - list the shopper's saved addresses
//! ```
//!
//! Every request carries the shopper's bearer credential in the `token`
//! header. Failures of any kind come back as a single [`ApiFailure`].
//!
//! # Example
//!
//! ```rust,ignore
//! use freshcart_storefront::api::{ApiClient, OrdersApi};
//!
//! let client = ApiClient::new(&config.api)?;
//! let shopper = client.authorized(token);
//! let order = shopper.create_cash_order(&cart_id, &address).await?;
//! ```

pub mod failure;
mod types;

pub use failure::{ApiFailure, FailureBody, FailureCategory, normalize};
pub use types::CheckoutSession;

use std::future::Future;
use std::sync::Arc;

use freshcart_core::{CartId, Order, SavedAddress, ShippingAddress};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::BearerToken;
use crate::config::ApiConfig;

use types::{AddressListEnvelope, CheckoutBody, OrderEnvelope, SessionEnvelope};

/// Header the backend reads the bearer credential from.
const TOKEN_HEADER: &str = "token";

const TIMEOUT_MESSAGE: &str = "The request timed out. Please try again.";
const CONNECT_MESSAGE: &str = "Unable to reach the server. Please check your connection.";

// =============================================================================
// Boundary traits
// =============================================================================

/// Order-creation and payment-session boundaries.
pub trait OrdersApi: Send + Sync {
    /// Create a cash-on-delivery order for the cart.
    fn create_cash_order(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
    ) -> impl Future<Output = Result<Order, ApiFailure>> + Send;

    /// Open a hosted card payment session for the cart.
    ///
    /// The backend may ignore `return_url` and send the shopper to its own
    /// completion page instead.
    fn create_checkout_session(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
        return_url: &str,
    ) -> impl Future<Output = Result<CheckoutSession, ApiFailure>> + Send;
}

/// Saved-address boundary.
pub trait AddressBook: Send + Sync {
    /// The shopper's saved addresses, in backend order.
    fn list_addresses(&self) -> impl Future<Output = Result<Vec<SavedAddress>, ApiFailure>> + Send;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Shared backend client.
///
/// Cheaply cloneable; holds one connection pool for the whole process.
/// Call [`ApiClient::authorized`] to act on behalf of a shopper.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("freshcart-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Bind the client to a shopper's credential.
    #[must_use]
    pub fn authorized(&self, token: BearerToken) -> ShopperApi {
        ShopperApi {
            inner: Arc::clone(&self.inner),
            token,
        }
    }
}

impl ApiClientInner {
    /// Resolve `segments` under the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Backend client acting for one shopper.
#[derive(Clone)]
pub struct ShopperApi {
    inner: Arc<ApiClientInner>,
    token: BearerToken,
}

impl std::fmt::Debug for ShopperApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopperApi")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.token)
            .finish()
    }
}

impl ShopperApi {
    fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(TOKEN_HEADER, self.token.expose())
    }

    /// Send a request and decode a success body as `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "backend request failed");
            return Err(ApiFailure::from_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await.map_err(transport_failure)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiFailure::Malformed(e.to_string()))
    }
}

impl OrdersApi for ShopperApi {
    #[instrument(skip(self, shipping_address), fields(cart_id = %cart_id))]
    async fn create_cash_order(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, ApiFailure> {
        let url = self.inner.endpoint(&["orders", cart_id.as_str()]);
        let request = self
            .request(reqwest::Method::POST, url)
            .json(&CheckoutBody { shipping_address });

        let envelope: OrderEnvelope = self.send(request).await?;
        debug!(order_id = %envelope.data.id, "cash order created");
        Ok(envelope.data)
    }

    #[instrument(skip(self, shipping_address), fields(cart_id = %cart_id))]
    async fn create_checkout_session(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
        return_url: &str,
    ) -> Result<CheckoutSession, ApiFailure> {
        let mut url = self
            .inner
            .endpoint(&["orders", "checkout-session", cart_id.as_str()]);
        url.query_pairs_mut().append_pair("url", return_url);

        let request = self
            .request(reqwest::Method::POST, url)
            .json(&CheckoutBody { shipping_address });

        let envelope: SessionEnvelope = self.send(request).await?;
        debug!("payment session opened");
        Ok(envelope.session)
    }
}

impl AddressBook for ShopperApi {
    #[instrument(skip(self))]
    async fn list_addresses(&self) -> Result<Vec<SavedAddress>, ApiFailure> {
        let url = self.inner.endpoint(&["addresses"]);
        let envelope: AddressListEnvelope =
            self.send(self.request(reqwest::Method::GET, url)).await?;
        debug!(count = envelope.data.len(), "loaded saved addresses");
        Ok(envelope.data)
    }
}

/// Map a transport error to a network failure with a shopper-facing
/// description where one is known.
fn transport_failure(error: reqwest::Error) -> ApiFailure {
    warn!(error = %error, "backend unreachable");
    let message = if error.is_timeout() {
        Some(TIMEOUT_MESSAGE.to_string())
    } else if error.is_connect() {
        Some(CONNECT_MESSAGE.to_string())
    } else {
        None
    };
    ApiFailure::Network { message }
}
