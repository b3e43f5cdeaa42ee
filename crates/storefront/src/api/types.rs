//! Wire envelopes for the backend REST API.

use freshcart_core::{Order, SavedAddress, ShippingAddress};
use serde::{Deserialize, Serialize};

/// Request body shared by both checkout boundaries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckoutBody<'a> {
    pub shipping_address: &'a ShippingAddress,
}

/// `{ status: "success", data: Order }`
#[derive(Debug, Deserialize)]
pub(super) struct OrderEnvelope {
    pub data: Order,
}

/// `{ status: "success", session: { url } }`
#[derive(Debug, Deserialize)]
pub(super) struct SessionEnvelope {
    pub session: CheckoutSession,
}

/// `{ results, data: [SavedAddress] }`
#[derive(Debug, Deserialize)]
pub(super) struct AddressListEnvelope {
    pub data: Vec<SavedAddress>,
}

/// A hosted payment session.
///
/// `url` is the only authoritative next navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_body_shape() {
        let address = ShippingAddress::new("12 Main St", "0100000000", "Cairo");
        let body = serde_json::to_value(CheckoutBody {
            shipping_address: &address,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "shippingAddress": { "details": "12 Main St", "phone": "0100000000", "city": "Cairo" }
            })
        );
    }

    #[test]
    fn test_session_envelope() {
        let json = r#"{"status":"success","session":{"url":"https://checkout.stripe.com/c/pay/cs_test_1","id":"cs_test_1"}}"#;
        let envelope: SessionEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.session.url, "https://checkout.stripe.com/c/pay/cs_test_1");
    }

    #[test]
    fn test_address_list_envelope() {
        let json = r#"{"results":1,"status":"success","data":[{"_id":"a1","name":"Home","details":"12 Main St","phone":"0100000000","city":"Cairo"}]}"#;
        let envelope: AddressListEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data.first().unwrap().id.as_str(), "a1");
    }
}
