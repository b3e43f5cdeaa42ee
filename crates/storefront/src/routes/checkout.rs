//! Checkout route.

use axum::{Json, extract::State};
use freshcart_core::{CartId, PaymentMethodType, PaymentMode, ShippingAddress};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::checkout::{CheckoutOrchestrator, CheckoutOutcome, CheckoutRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Checkout form posted by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub cart_id: CartId,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethodType,
    /// Card only. Defaults to the storefront's success landing.
    pub return_url: Option<String>,
}

impl CheckoutForm {
    /// Resolve the form into a checkout request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a card return URL is not an absolute
    /// http(s) URL.
    pub fn into_request(self, default_return_url: &str) -> Result<CheckoutRequest> {
        let payment_mode = match self.payment_method {
            PaymentMethodType::Cash => PaymentMode::Cash,
            PaymentMethodType::Card => {
                let return_url = match self.return_url {
                    Some(url) => checked_return_url(&url)?,
                    None => default_return_url.to_string(),
                };
                PaymentMode::Card { return_url }
            }
        };

        Ok(CheckoutRequest {
            cart_id: self.cart_id,
            shipping_address: self.shipping_address,
            payment_mode,
        })
    }
}

fn checked_return_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|_| AppError::BadRequest("invalid returnUrl".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::BadRequest("invalid returnUrl".to_string()));
    }
    Ok(url.into())
}

/// Run one checkout attempt.
///
/// Backend and validation failures are reported in the body with
/// `success: false`; only a malformed form is an error response.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    RequireSession(token): RequireSession,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<CheckoutOutcome>> {
    let request = form.into_request(&state.config().default_return_url())?;
    let orchestrator = CheckoutOrchestrator::new(state.api().authorized(token));

    let outcome = orchestrator.checkout(&request).await;

    match &outcome {
        CheckoutOutcome::OrderPlaced { order, .. } => {
            add_breadcrumb(
                "checkout",
                "Cash order placed",
                Some(&[("order_id", order.id.as_str())]),
            );
        }
        CheckoutOutcome::PaymentRedirect { .. } => {
            add_breadcrumb("checkout", "Payment session opened", None);
        }
        CheckoutOutcome::Failed { .. } => {}
    }

    Ok(Json(outcome))
}
