//! Core types for FreshCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod order;
pub mod status;

pub use address::{AddressError, SavedAddress, ShippingAddress};
pub use id::*;
pub use order::{Order, OrderItem};
pub use status::*;
