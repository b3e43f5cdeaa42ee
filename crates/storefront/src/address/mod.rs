//! Shipping address selection during checkout.
//!
//! [`AddressSelector`] owns the "existing address vs. new address" choice.
//! It starts in [`SelectionState::Loading`] while the saved addresses are
//! fetched, then settles on the first saved address, or on a new address
//! when there are none or the fetch fails.
//!
//! Transitions return the events they emit. A `SelectionChanged` event
//! accompanies every settled choice; an `AddressSelected` event carrying the
//! normalized [`ShippingAddress`] follows only when an existing address was
//! picked.
//!
//! # Ordering
//!
//! A load is started with [`AddressSelector::begin_load`] and finished with
//! [`AddressSelector::complete_load`], using the returned [`LoadTicket`].
//! - A choice the shopper makes while the load is in flight wins: the late
//!   result still fills the address list but does not move the selection.
//! - Disabling or disposing the selector cancels the load: the late result
//!   is dropped without touching state or emitting anything.

use freshcart_core::{AddressId, SavedAddress, ShippingAddress};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{AddressBook, ApiFailure};

/// Shown above the new-address form when saved addresses cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load saved addresses";

/// Which kind of address is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Existing,
    New,
}

/// Current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "addressId", rename_all = "lowercase")]
pub enum SelectionState {
    #[default]
    Loading,
    Existing(AddressId),
    New,
}

/// Events emitted by selection transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AddressEvent {
    #[serde(rename_all = "camelCase")]
    SelectionChanged {
        kind: SelectionKind,
        address_id: Option<AddressId>,
    },
    AddressSelected { address: ShippingAddress },
}

/// Handle for one in-flight address load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the ticket to complete_load when the load finishes"]
pub struct LoadTicket {
    generation: u64,
}

/// Existing-vs-new address state machine for one checkout screen.
#[derive(Debug, Default)]
pub struct AddressSelector {
    state: SelectionState,
    addresses: Vec<SavedAddress>,
    error: Option<String>,
    disabled: bool,
    disposed: bool,
    generation: u64,
    pending: Option<u64>,
    chosen_while_loading: bool,
}

impl AddressSelector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Saved addresses from the latest completed load.
    #[must_use]
    pub fn addresses(&self) -> &[SavedAddress] {
        &self.addresses
    }

    /// User-facing message from a failed load.
    ///
    /// May be set while the state is `New`: the error banner and the
    /// new-address form are shown together.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The selected saved address, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&SavedAddress> {
        match &self.state {
            SelectionState::Existing(id) => self.find(id),
            SelectionState::Loading | SelectionState::New => None,
        }
    }

    /// The normalized address to check out with, if an existing address is
    /// selected.
    #[must_use]
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        self.selected().map(SavedAddress::to_shipping_address)
    }

    /// Start loading saved addresses.
    ///
    /// Returns `None` while disabled or after disposal. Starting a new load
    /// supersedes any load still in flight.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.disabled || self.disposed {
            return None;
        }

        self.generation += 1;
        self.pending = Some(self.generation);
        self.chosen_while_loading = false;
        self.error = None;
        self.state = SelectionState::Loading;

        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Apply the result of the load identified by `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<SavedAddress>, ApiFailure>,
    ) -> Vec<AddressEvent> {
        if self.disposed || self.pending != Some(ticket.generation) {
            debug!("ignoring stale address load");
            return Vec::new();
        }
        self.pending = None;

        let user_chose = std::mem::take(&mut self.chosen_while_loading);

        match result {
            Ok(addresses) => {
                self.addresses = addresses;
                if user_chose {
                    return Vec::new();
                }
                match self.addresses.first().map(|first| first.id.clone()) {
                    Some(first) => self.settle_existing(first),
                    None => self.settle_new(),
                }
            }
            Err(failure) => {
                warn!(error = %failure, "failed to load saved addresses");
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
                if user_chose {
                    return Vec::new();
                }
                self.settle_new()
            }
        }
    }

    /// Pick a saved address.
    ///
    /// No-op while disabled, after disposal, or if `id` is not among the
    /// loaded addresses.
    pub fn select_existing(&mut self, id: &AddressId) -> Vec<AddressEvent> {
        if self.disabled || self.disposed || self.find(id).is_none() {
            return Vec::new();
        }
        self.note_user_choice();
        self.settle_existing(id.clone())
    }

    /// Switch to entering a new address.
    ///
    /// No-op while disabled or after disposal.
    pub fn select_new(&mut self) -> Vec<AddressEvent> {
        if self.disabled || self.disposed {
            return Vec::new();
        }
        self.note_user_choice();
        self.settle_new()
    }

    /// Assert or release the disabled flag.
    ///
    /// Disabling cancels a load in flight.
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled && self.pending.take().is_some() {
            debug!("address load cancelled by disable");
        }
        self.disabled = disabled;
    }

    /// Tear the selector down. Later completions and selections are ignored.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.pending = None;
    }

    fn note_user_choice(&mut self) {
        if self.pending.is_some() {
            self.chosen_while_loading = true;
        }
    }

    fn find(&self, id: &AddressId) -> Option<&SavedAddress> {
        self.addresses.iter().find(|address| &address.id == id)
    }

    fn settle_existing(&mut self, id: AddressId) -> Vec<AddressEvent> {
        let Some(address) = self.find(&id).map(SavedAddress::to_shipping_address) else {
            return Vec::new();
        };
        self.state = SelectionState::Existing(id.clone());
        vec![
            AddressEvent::SelectionChanged {
                kind: SelectionKind::Existing,
                address_id: Some(id),
            },
            AddressEvent::AddressSelected { address },
        ]
    }

    fn settle_new(&mut self) -> Vec<AddressEvent> {
        self.state = SelectionState::New;
        vec![AddressEvent::SelectionChanged {
            kind: SelectionKind::New,
            address_id: None,
        }]
    }
}

/// Load saved addresses into a shared selector.
///
/// The lock is released while the boundary call is in flight, so the
/// shopper's selections and disable/dispose calls interleave with the load.
pub async fn load_addresses<B: AddressBook>(
    selector: &Mutex<AddressSelector>,
    book: &B,
) -> Vec<AddressEvent> {
    let Some(ticket) = selector.lock().await.begin_load() else {
        return Vec::new();
    };
    let result = book.list_addresses().await;
    selector.lock().await.complete_load(ticket, result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::api::FailureBody;

    fn saved(id: &str, city: &str) -> SavedAddress {
        SavedAddress {
            id: AddressId::new(id),
            name: format!("Address {id}"),
            details: format!("{id} Main St"),
            phone: "0100000000".to_string(),
            city: city.to_string(),
        }
    }

    fn changed(kind: SelectionKind, id: Option<&str>) -> AddressEvent {
        AddressEvent::SelectionChanged {
            kind,
            address_id: id.map(AddressId::new),
        }
    }

    fn selected(address: &SavedAddress) -> AddressEvent {
        AddressEvent::AddressSelected {
            address: address.to_shipping_address(),
        }
    }

    fn server_error() -> ApiFailure {
        ApiFailure::Status {
            status: 500,
            body: FailureBody::Empty,
        }
    }

    fn count_selected(events: &[AddressEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AddressEvent::AddressSelected { .. }))
            .count()
    }

    #[test]
    fn test_starts_loading() {
        let selector = AddressSelector::new();
        assert_eq!(selector.state(), &SelectionState::Loading);
        assert!(selector.shipping_address().is_none());
    }

    #[test]
    fn test_non_empty_load_selects_first() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        let home = saved("a1", "Cairo");
        let work = saved("a2", "Giza");

        let events = selector.complete_load(ticket, Ok(vec![home.clone(), work]));

        assert_eq!(
            events,
            vec![changed(SelectionKind::Existing, Some("a1")), selected(&home)]
        );
        assert_eq!(count_selected(&events), 1);
        assert_eq!(selector.state(), &SelectionState::Existing(AddressId::new("a1")));
        assert_eq!(selector.shipping_address(), Some(home.to_shipping_address()));
        assert!(!selector.is_loading());
    }

    #[test]
    fn test_empty_load_switches_to_new() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();

        let events = selector.complete_load(ticket, Ok(Vec::new()));

        assert_eq!(events, vec![changed(SelectionKind::New, None)]);
        assert_eq!(count_selected(&events), 0);
        assert_eq!(selector.state(), &SelectionState::New);
        assert!(selector.error().is_none());
    }

    #[test]
    fn test_failed_load_shows_error_and_new_form() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();

        let events = selector.complete_load(ticket, Err(server_error()));

        assert_eq!(events, vec![changed(SelectionKind::New, None)]);
        assert_eq!(selector.state(), &SelectionState::New);
        assert_eq!(selector.error(), Some(LOAD_FAILED_MESSAGE));
    }

    #[test]
    fn test_switch_between_existing_and_new() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        let home = saved("a1", "Cairo");
        let work = saved("a2", "Giza");
        let _ = selector.complete_load(ticket, Ok(vec![home, work.clone()]));

        let events = selector.select_new();
        assert_eq!(events, vec![changed(SelectionKind::New, None)]);
        assert_eq!(selector.state(), &SelectionState::New);
        assert!(selector.selected().is_none());

        let events = selector.select_existing(&AddressId::new("a2"));
        assert_eq!(
            events,
            vec![changed(SelectionKind::Existing, Some("a2")), selected(&work)]
        );
        assert_eq!(selector.shipping_address(), Some(work.to_shipping_address()));
    }

    #[test]
    fn test_reselecting_same_address_re_emits() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        let home = saved("a1", "Cairo");
        let _ = selector.complete_load(ticket, Ok(vec![home.clone()]));

        let events = selector.select_existing(&AddressId::new("a1"));
        assert_eq!(
            events,
            vec![changed(SelectionKind::Existing, Some("a1")), selected(&home)]
        );
    }

    #[test]
    fn test_unknown_address_is_ignored() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        let _ = selector.complete_load(ticket, Ok(vec![saved("a1", "Cairo")]));

        assert!(selector.select_existing(&AddressId::new("missing")).is_empty());
        assert_eq!(selector.state(), &SelectionState::Existing(AddressId::new("a1")));
    }

    #[test]
    fn test_disabled_blocks_mutations() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        let _ = selector.complete_load(ticket, Ok(vec![saved("a1", "Cairo"), saved("a2", "Giza")]));

        selector.set_disabled(true);
        assert!(selector.select_new().is_empty());
        assert!(selector.select_existing(&AddressId::new("a2")).is_empty());
        assert!(selector.begin_load().is_none());
        assert_eq!(selector.state(), &SelectionState::Existing(AddressId::new("a1")));

        selector.set_disabled(false);
        assert_eq!(selector.select_new().len(), 1);
    }

    #[test]
    fn test_user_choice_beats_slow_load() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();

        let events = selector.select_new();
        assert_eq!(events, vec![changed(SelectionKind::New, None)]);

        let events = selector.complete_load(ticket, Ok(vec![saved("a1", "Cairo")]));
        assert!(events.is_empty());
        assert_eq!(selector.state(), &SelectionState::New);
        assert_eq!(selector.addresses().len(), 1);

        // The late list is usable for an explicit choice afterwards.
        assert_eq!(selector.select_existing(&AddressId::new("a1")).len(), 2);
    }

    #[test]
    fn test_disable_cancels_pending_load() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        selector.set_disabled(true);
        selector.set_disabled(false);

        let events = selector.complete_load(ticket, Ok(vec![saved("a1", "Cairo")]));
        assert!(events.is_empty());
        assert_eq!(selector.state(), &SelectionState::Loading);
        assert!(selector.addresses().is_empty());
    }

    #[test]
    fn test_dispose_drops_completion() {
        let mut selector = AddressSelector::new();
        let ticket = selector.begin_load().unwrap();
        selector.dispose();

        assert!(selector.complete_load(ticket, Err(server_error())).is_empty());
        assert!(selector.error().is_none());
        assert_eq!(selector.state(), &SelectionState::Loading);
        assert!(selector.select_new().is_empty());
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut selector = AddressSelector::new();
        let first = selector.begin_load().unwrap();
        let second = selector.begin_load().unwrap();

        assert!(selector.complete_load(first, Ok(vec![saved("a1", "Cairo")])).is_empty());
        let events = selector.complete_load(second, Ok(vec![saved("a2", "Giza")]));
        assert_eq!(events.first(), Some(&changed(SelectionKind::Existing, Some("a2"))));
    }

    #[test]
    fn test_event_wire_format() {
        let event = changed(SelectionKind::Existing, Some("a1"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "event": "selectionChanged", "kind": "existing", "addressId": "a1" })
        );
        assert_eq!(
            serde_json::to_value(SelectionState::Existing(AddressId::new("a1"))).unwrap(),
            serde_json::json!({ "state": "existing", "addressId": "a1" })
        );
    }

    /// Address book that answers once the test releases it.
    struct GatedBook {
        release: Mutex<Option<oneshot::Receiver<()>>>,
        addresses: Vec<SavedAddress>,
    }

    impl AddressBook for GatedBook {
        async fn list_addresses(&self) -> Result<Vec<SavedAddress>, ApiFailure> {
            let gate = self.release.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(self.addresses.clone())
        }
    }

    fn gated(addresses: Vec<SavedAddress>) -> (GatedBook, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            GatedBook {
                release: Mutex::new(Some(rx)),
                addresses,
            },
            tx,
        )
    }

    #[tokio::test]
    async fn test_load_addresses_auto_selects() {
        let selector = Mutex::new(AddressSelector::new());
        let (book, release) = gated(vec![saved("a1", "Cairo")]);
        release.send(()).unwrap();

        let events = load_addresses(&selector, &book).await;

        assert_eq!(count_selected(&events), 1);
        assert_eq!(
            selector.lock().await.state(),
            &SelectionState::Existing(AddressId::new("a1"))
        );
    }

    #[tokio::test]
    async fn test_load_addresses_user_choice_in_flight() {
        let selector = Mutex::new(AddressSelector::new());
        let (book, release) = gated(vec![saved("a1", "Cairo")]);

        let (load_events, user_events) = tokio::join!(load_addresses(&selector, &book), async {
            tokio::task::yield_now().await;
            let events = selector.lock().await.select_new();
            release.send(()).unwrap();
            events
        });

        assert_eq!(user_events, vec![changed(SelectionKind::New, None)]);
        assert!(load_events.is_empty());
        assert_eq!(selector.lock().await.state(), &SelectionState::New);
    }

    #[tokio::test]
    async fn test_load_addresses_after_dispose() {
        let selector = Mutex::new(AddressSelector::new());
        let (book, release) = gated(vec![saved("a1", "Cairo")]);

        let (load_events, ()) = tokio::join!(load_addresses(&selector, &book), async {
            tokio::task::yield_now().await;
            selector.lock().await.dispose();
            release.send(()).unwrap();
        });

        assert!(load_events.is_empty());
        assert_eq!(selector.lock().await.state(), &SelectionState::Loading);
    }
}
