//! ShopHub Core - Shared domain types.
//!
//! This crate provides the types shared by all ShopHub components:
//! - `storefront` - Cart synchronization, checkout and the REST API client
//! - `cli` - Command-line driver for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, quantities, line items, prices, phone numbers,
//!   delivery addresses and user roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
