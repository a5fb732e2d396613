//! ShopHub storefront client library.
//!
//! Keeps a shopper's cart in step with the ShopHub REST API and turns a cart
//! into a paid order.
//!
//! - [`cart::CartStore`] holds the optimistic local cart
//! - [`cart::CartSynchronizer`] hydrates it with product details and pushes it
//! - [`checkout::CheckoutSequencer`] runs order creation, cart clearing and
//!   payment initiation in order
//! - [`shop::ShopSession`] ties them to a signed-in account

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notice;
pub mod session;
pub mod shop;

pub use api::{ApiClient, ApiError, CommerceApi};
pub use config::StorefrontConfig;
pub use error::{Result, StorefrontError};
pub use session::AuthSession;
pub use shop::ShopSession;
