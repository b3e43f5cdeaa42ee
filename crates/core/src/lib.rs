//! FreshCart Core - Shared domain types.
//!
//! This crate provides the types shared by every FreshCart component:
//! - `storefront` - Shopper-facing session, address and checkout service
//! - `integration-tests` - End-to-end checks against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, shipping addresses, orders and payment modes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
