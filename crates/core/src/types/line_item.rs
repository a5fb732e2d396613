//! Cart line items.
//!
//! The authoritative cart record is a list of `{productId, quantity}` pairs.
//! Display data (name, price, image) is looked up per product and is never part
//! of a [`LineItem`].

use core::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one.
    #[error("quantity must be at least 1")]
    Zero,
}

/// A positive item count.
///
/// A zero quantity is unrepresentable, so a cart can never persist an entry
/// with quantity `0`. Use [`Quantity::decremented`] to step down without
/// crossing the floor.
///
/// ## Examples
///
/// ```
/// use shophub_core::Quantity;
///
/// let two = Quantity::new(2).unwrap();
/// assert_eq!(two.decremented(), Some(Quantity::ONE));
/// assert_eq!(Quantity::ONE.decremented(), None);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `value` is zero.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(value) {
            Some(v) => Ok(Self(v)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Returns the count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Adds `other`, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }

    /// One less, or `None` when already at the floor of 1.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One product's presence in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: Quantity) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}
