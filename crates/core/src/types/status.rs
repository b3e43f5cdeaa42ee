//! Payment mode and payment status enums.

use serde::{Deserialize, Serialize};

/// How an order is paid, as reported by the backend on the order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodType {
    /// Cash on delivery.
    #[default]
    Cash,
    /// Card payment through the hosted payment page.
    Card,
}

impl std::fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for PaymentMethodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// The payment path a shopper picked for one checkout attempt.
///
/// Card payments carry the URL the hosted payment page should return to.
/// The backend may ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Card {
        #[serde(rename = "returnUrl")]
        return_url: String,
    },
}

impl PaymentMode {
    /// The payment method type this mode results in.
    #[must_use]
    pub const fn method(&self) -> PaymentMethodType {
        match self {
            Self::Cash => PaymentMethodType::Cash,
            Self::Card { .. } => PaymentMethodType::Card,
        }
    }
}
