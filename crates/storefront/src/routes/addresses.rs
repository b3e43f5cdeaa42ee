//! Saved address route.

use axum::{Json, extract::State};
use freshcart_core::SavedAddress;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::address::{AddressEvent, AddressSelector, SelectionState, load_addresses};
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Saved addresses together with the initial selection.
#[derive(Debug, Serialize)]
pub struct AddressView {
    pub addresses: Vec<SavedAddress>,
    pub selection: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<AddressEvent>,
}

impl AddressView {
    fn new(selector: &AddressSelector, events: Vec<AddressEvent>) -> Self {
        Self {
            addresses: selector.addresses().to_vec(),
            selection: selector.state().clone(),
            error: selector.error().map(String::from),
            events,
        }
    }
}

/// Load the shopper's saved addresses and settle the initial selection.
///
/// A failed load is not an error response: the view falls back to a new
/// address with the load error attached.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireSession(token): RequireSession,
) -> Json<AddressView> {
    let shopper = state.api().authorized(token);
    let selector = Mutex::new(AddressSelector::new());

    let events = load_addresses(&selector, &shopper).await;
    let selector = selector.into_inner();

    Json(AddressView::new(&selector, events))
}
