//! Core types for ShopHub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod line_item;
pub mod phone;
pub mod price;
pub mod status;

pub use address::{AddressError, DeliveryAddress};
pub use id::*;
pub use line_item::{LineItem, Quantity, QuantityError};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{CurrencyCode, Price};
pub use status::*;
