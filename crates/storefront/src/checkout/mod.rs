//! Checkout orchestration.
//!
//! Converts a cart into an order through one of two payment paths:
//!
//! - **Cash**: the backend creates the order immediately.
//! - **Card**: the backend opens a hosted payment session and the shopper is
//!   sent to its URL. The backend sometimes ignores the return URL it is
//!   given, so the session URL is the only target a caller may rely on.
//!
//! Each attempt makes exactly one boundary call, never retries, and never
//! fails: every failure comes back as [`CheckoutOutcome::Failed`].

use freshcart_core::{CartId, Order, OrderId, PaymentMode, ShippingAddress};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::api::{ApiFailure, FailureCategory, OrdersApi};

/// Message attached to a successful cash order.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully";

/// One checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    pub shipping_address: ShippingAddress,
    pub payment_mode: PaymentMode,
}

/// Normalized result of a checkout attempt.
///
/// Serializes to the flat shape
/// `{ success, message?, orderId?, stripeUrl?, order? }` where only the
/// fields of the active variant are present.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Cash order created.
    OrderPlaced { order: Box<Order>, message: String },
    /// Card payment session opened; send the shopper to `stripe_url`.
    PaymentRedirect { stripe_url: String },
    /// Nothing was created.
    Failed {
        message: String,
        category: FailureCategory,
    },
}

impl CheckoutOutcome {
    fn from_failure(failure: &ApiFailure) -> Self {
        Self::Failed {
            message: failure.user_message(),
            category: failure.category(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::OrderPlaced { message, .. } | Self::Failed { message, .. } => Some(message),
            Self::PaymentRedirect { .. } => None,
        }
    }

    #[must_use]
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::OrderPlaced { order, .. } => Some(&order.id),
            _ => None,
        }
    }

    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::OrderPlaced { order, .. } => Some(order),
            _ => None,
        }
    }

    #[must_use]
    pub fn stripe_url(&self) -> Option<&str> {
        match self {
            Self::PaymentRedirect { stripe_url } => Some(stripe_url),
            _ => None,
        }
    }

    #[must_use]
    pub const fn failure_category(&self) -> Option<FailureCategory> {
        match self {
            Self::Failed { category, .. } => Some(*category),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<&'a OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stripe_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a Order>,
}

impl Serialize for CheckoutOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeWire {
            success: self.is_success(),
            message: self.message(),
            order_id: self.order_id(),
            stripe_url: self.stripe_url(),
            order: self.order(),
        }
        .serialize(serializer)
    }
}

/// Drives a checkout attempt against the order boundaries.
#[derive(Debug, Clone)]
pub struct CheckoutOrchestrator<A> {
    api: A,
}

impl<A: OrdersApi> CheckoutOrchestrator<A> {
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Run the attempt on the payment path the caller picked.
    pub async fn checkout(&self, request: &CheckoutRequest) -> CheckoutOutcome {
        match &request.payment_mode {
            PaymentMode::Cash => {
                self.create_cash_order(&request.cart_id, &request.shipping_address)
                    .await
            }
            PaymentMode::Card { return_url } => {
                self.create_card_session(&request.cart_id, &request.shipping_address, return_url)
                    .await
            }
        }
    }

    /// Place a cash-on-delivery order.
    #[instrument(skip(self, shipping_address), fields(cart_id = %cart_id))]
    pub async fn create_cash_order(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
    ) -> CheckoutOutcome {
        if let Some(outcome) = reject_invalid(shipping_address) {
            return outcome;
        }

        match self.api.create_cash_order(cart_id, shipping_address).await {
            Ok(order) => {
                info!(order_id = %order.id, "cash order placed");
                CheckoutOutcome::OrderPlaced {
                    order: Box::new(order),
                    message: ORDER_PLACED_MESSAGE.to_string(),
                }
            }
            Err(failure) => {
                warn!(error = %failure, "cash order failed");
                CheckoutOutcome::from_failure(&failure)
            }
        }
    }

    /// Open a hosted card payment session.
    ///
    /// `return_url` is passed along but may be ignored by the backend.
    #[instrument(skip(self, shipping_address), fields(cart_id = %cart_id))]
    pub async fn create_card_session(
        &self,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
        return_url: &str,
    ) -> CheckoutOutcome {
        if let Some(outcome) = reject_invalid(shipping_address) {
            return outcome;
        }

        match self
            .api
            .create_checkout_session(cart_id, shipping_address, return_url)
            .await
        {
            Ok(session) => {
                info!("card payment session opened");
                CheckoutOutcome::PaymentRedirect {
                    stripe_url: session.url,
                }
            }
            Err(failure) => {
                warn!(error = %failure, "card payment session failed");
                CheckoutOutcome::from_failure(&failure)
            }
        }
    }
}

/// An address missing required fields never reaches the backend.
fn reject_invalid(shipping_address: &ShippingAddress) -> Option<CheckoutOutcome> {
    let error = shipping_address.validate().err()?;
    warn!(%error, "rejecting checkout with incomplete address");
    Some(CheckoutOutcome::Failed {
        message: capitalize(&error.to_string()),
        category: FailureCategory::Validation,
    })
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}
