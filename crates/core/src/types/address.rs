//! Shipping and saved address types.

use serde::{Deserialize, Serialize};

use crate::AddressId;

/// Errors that can occur when validating an address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The street/details line is empty.
    #[error("address details cannot be empty")]
    EmptyDetails,
    /// The phone number is empty.
    #[error("phone number cannot be empty")]
    EmptyPhone,
    /// The city is empty.
    #[error("city cannot be empty")]
    EmptyCity,
    /// A saved address needs a name.
    #[error("saved address name cannot be empty")]
    EmptyName,
}

/// The address an order ships to.
///
/// This is the shape sent as `shippingAddress` to both checkout boundaries.
///
/// ## Constraints
///
/// - `details`, `phone` and `city` must be non-empty to place an order
/// - `name` is optional at checkout
///
/// ## Examples
///
/// ```
/// use freshcart_core::ShippingAddress;
///
/// let address = ShippingAddress::new("12 Main St", "0100000000", "Cairo");
/// assert!(address.validate().is_ok());
///
/// let blank = ShippingAddress::new("", "0100000000", "Cairo");
/// assert!(blank.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub details: String,
    pub phone: String,
    pub city: String,
}

impl ShippingAddress {
    /// Create an unnamed shipping address.
    #[must_use]
    pub fn new(
        details: impl Into<String>,
        phone: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            details: details.into(),
            phone: phone.into(),
            city: city.into(),
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check that the address can be used to place an order.
    ///
    /// Whitespace-only fields count as empty.
    ///
    /// # Errors
    ///
    /// Returns the first required field found empty, in the order
    /// details, phone, city.
    pub fn validate(&self) -> Result<(), AddressError> {
        if self.details.trim().is_empty() {
            return Err(AddressError::EmptyDetails);
        }
        if self.phone.trim().is_empty() {
            return Err(AddressError::EmptyPhone);
        }
        if self.city.trim().is_empty() {
            return Err(AddressError::EmptyCity);
        }
        Ok(())
    }
}

/// An address stored on the shopper's account.
///
/// Unlike [`ShippingAddress`], a saved address always has a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub name: String,
    pub details: String,
    pub phone: String,
    pub city: String,
}

impl SavedAddress {
    /// Validate the address for persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or any shipping field is empty.
    pub fn validate(&self) -> Result<(), AddressError> {
        if self.name.trim().is_empty() {
            return Err(AddressError::EmptyName);
        }
        self.to_shipping_address().validate()
    }

    /// Normalize into the shape the checkout boundaries expect.
    #[must_use]
    pub fn to_shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: Some(self.name.clone()),
            details: self.details.clone(),
            phone: self.phone.clone(),
            city: self.city.clone(),
        }
    }
}

impl From<&SavedAddress> for ShippingAddress {
    fn from(address: &SavedAddress) -> Self {
        address.to_shipping_address()
    }
}
