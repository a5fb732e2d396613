//! Local cart state and its synchronization with the server cart.
//!
//! - [`CartStore`] - the optimistic local cart, unique by product
//! - [`CartSynchronizer`] - fetch-on-load, push-on-mutate, push-before-checkout
//! - [`CartView`] - line items joined with product details for display

mod store;
mod sync;
mod view;

pub use store::CartStore;
pub use sync::{CartSynchronizer, SyncReport};
pub use view::{CartItemView, CartView, PLACEHOLDER_IMAGE, UNAVAILABLE_PRODUCT_NAME};
