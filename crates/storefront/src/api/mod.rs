//! Commerce REST API access.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the seam between the cart/checkout logic and the
//!   network; [`ApiClient`] is the `reqwest` implementation
//! - The server is the source of truth for carts and orders; the only local
//!   state is the product detail memoization in [`ProductCache`]
//! - No call is retried automatically; every retry is a user action
//!
//! # Endpoints
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | Fetch product | GET | `/products/singleProduct/{id}` |
//! | Fetch own cart | GET | `/cart/mycart` |
//! | Replace cart | PATCH | `/cart/updateCart` |
//! | Add to cart | POST | `/cart/addToCart` |
//! | Create order | POST | `/order/createOrder` |
//! | Initiate payment | POST | `/order/initiatePayment` |

mod cache;
mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod types;

use std::sync::Arc;

pub use cache::ProductCache;
pub use client::ApiClient;
pub use types::*;

use shophub_core::{LineItem, OrderId, ProductId};
use thiserror::Error;

use crate::session::BearerToken;

/// Shown when the server gives no usable error body.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token was rejected (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A success response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    /// A message safe to show to the shopper.
    ///
    /// Client errors carry the server's own message; transport failures and
    /// server faults collapse into a generic network message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::NotFound(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment and try again.".to_string(),
            Self::Api { status, message } if *status < 500 => message.clone(),
            Self::Api { .. } | Self::Http(_) | Self::Parse(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Operations the storefront needs from the commerce API.
///
/// Every method except [`CommerceApi::fetch_product`] is authenticated.
#[allow(async_fn_in_trait)]
pub trait CommerceApi {
    /// Fetch one product's display data.
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// Fetch the signed-in user's server cart.
    async fn fetch_cart(&self, token: &BearerToken) -> Result<RemoteCart, ApiError>;

    /// Overwrite the server cart with exactly `items`.
    async fn replace_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError>;

    /// Merge `items` into the server cart.
    async fn add_to_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError>;

    /// Create an order and return its ID.
    async fn create_order(&self, token: &BearerToken, order: &NewOrder) -> Result<OrderId, ApiError>;

    /// Ask the payment gateway for a hosted payment page for `order_id`.
    async fn initiate_payment(
        &self,
        token: &BearerToken,
        order_id: &OrderId,
    ) -> Result<PaymentInitiation, ApiError>;
}

impl<T: CommerceApi> CommerceApi for Arc<T> {
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        (**self).fetch_product(id).await
    }

    async fn fetch_cart(&self, token: &BearerToken) -> Result<RemoteCart, ApiError> {
        (**self).fetch_cart(token).await
    }

    async fn replace_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        (**self).replace_cart(token, items).await
    }

    async fn add_to_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        (**self).add_to_cart(token, items).await
    }

    async fn create_order(&self, token: &BearerToken, order: &NewOrder) -> Result<OrderId, ApiError> {
        (**self).create_order(token, order).await
    }

    async fn initiate_payment(
        &self,
        token: &BearerToken,
        order_id: &OrderId,
    ) -> Result<PaymentInitiation, ApiError> {
        (**self).initiate_payment(token, order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_server_faults() {
        let err = ApiError::Api {
            status: 500,
            message: "MongoServerError: connection pool closed".to_string(),
        };
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);

        let err = ApiError::Parse("missing orderId".to_string());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_keeps_client_errors() {
        let err = ApiError::Api {
            status: 400,
            message: "Insufficient stock".to_string(),
        };
        assert_eq!(err.user_message(), "Insufficient stock");
        assert!(ApiError::Unauthorized("jwt expired".to_string()).is_unauthorized());
    }
}
