//! FreshCart storefront library.
//!
//! Shopper-facing session handling, shipping address selection and checkout
//! against the FreshCart backend REST API.
//!
//! - [`auth`] - Bearer credential decoding and the session guard
//! - [`address`] - Existing-vs-new shipping address selection
//! - [`checkout`] - Cash orders and hosted card payment sessions
//! - [`api`] - Backend client and failure normalization
//! - [`routes`] - HTTP surface

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
