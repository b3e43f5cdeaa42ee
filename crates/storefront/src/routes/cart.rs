//! Post-payment landing routes.
//!
//! The hosted payment page returns shoppers to `/cart/success` or
//! `/cart/failure`. Some backend deployments return to
//! `/cart/success/allorders` instead; that path permanently redirects to the
//! canonical landing so both resolve to the same page.

use axum::{
    Json,
    extract::RawQuery,
    response::Redirect,
};
use serde::Serialize;

use crate::config::SUCCESS_PATH;
use crate::middleware::RequireSession;

/// Landing page state after the hosted payment flow.
#[derive(Debug, Serialize)]
pub struct PaymentLanding {
    pub status: &'static str,
    pub message: &'static str,
}

/// Canonical post-payment success landing.
pub async fn success(RequireSession(_): RequireSession) -> Json<PaymentLanding> {
    Json(PaymentLanding {
        status: "success",
        message: "Payment received. Your order is being processed.",
    })
}

/// Canonical post-payment failure landing.
pub async fn failure(RequireSession(_): RequireSession) -> Json<PaymentLanding> {
    Json(PaymentLanding {
        status: "failure",
        message: "Payment was not completed. You have not been charged.",
    })
}

/// Redirect the legacy completion path to the canonical landing.
///
/// The query string is carried over unchanged.
pub async fn legacy_success(RawQuery(query): RawQuery) -> Redirect {
    Redirect::permanent(&canonical_success_uri(query.as_deref()))
}

fn canonical_success_uri(query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{SUCCESS_PATH}?{query}"),
        _ => SUCCESS_PATH.to_string(),
    }
}
