//! Order records returned by the order-creation boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderId, PaymentMethodType, ShippingAddress, UserId};

/// A placed order.
///
/// Field names follow the backend's camelCase wire format; the document id
/// arrives as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user: UserId,
    #[serde(default)]
    pub cart_items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    pub total_order_price: Decimal,
    pub payment_method_type: PaymentMethodType,
    pub is_paid: bool,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order.
///
/// The backend sends `product` either as a bare id or as a populated
/// product document, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub count: u32,
    pub product: serde_json::Value,
    pub price: Decimal,
}
