//! `reqwest` implementation of [`CommerceApi`].

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shophub_core::{LineItem, OrderId, ProductId};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::cache::ProductCache;
use super::types::{
    ApiMessage, CartEnvelope, CartProductsBody, NewOrder, OrderEnvelope, PaymentInitiation,
    PaymentRequestBody, Product, ProductEnvelope, RemoteCart,
};
use super::{ApiError, CommerceApi, NETWORK_ERROR_MESSAGE};
use crate::config::ApiConfig;
use crate::session::BearerToken;

const USER_AGENT: &str = concat!("shophub-storefront/", env!("CARGO_PKG_VERSION"));

/// Client for the commerce REST API.
///
/// Cheap to clone; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    products: ProductCache,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialization fails).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                products: ProductCache::new(
                    config.product_cache_capacity,
                    config.product_cache_ttl,
                ),
            }),
        })
    }

    /// The product memoization shared by all clones of this client.
    #[must_use]
    pub fn product_cache(&self) -> &ProductCache {
        &self.inner.products
    }

    /// Endpoint paths are appended to the base verbatim.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4();
        let response = request
            .header("X-Request-Id", request_id.to_string())
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!(
                status = %status,
                request_id = %request_id,
                message = %message,
                "API returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                request_id = %request_id,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    fn authed(&self, request: RequestBuilder, token: &BearerToken) -> RequestBuilder {
        request.header(AUTHORIZATION, token.header_value())
    }
}

/// Extract the server's `message` from an error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiMessage>(body) {
        Ok(ApiMessage {
            message: Some(message),
        }) if !message.trim().is_empty() => message,
        Ok(_) => "Something went wrong".to_string(),
        Err(_) => NETWORK_ERROR_MESSAGE.to_string(),
    }
}

impl CommerceApi for ApiClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let request = self
            .inner
            .client
            .get(self.url(&format!(
                "/products/singleProduct/{}",
                urlencoding::encode(id.as_str())
            )));
        let envelope: ProductEnvelope = self.send(request).await?;

        self.inner.products.insert(envelope.product.clone()).await;

        Ok(envelope.product)
    }

    #[instrument(skip_all)]
    async fn fetch_cart(&self, token: &BearerToken) -> Result<RemoteCart, ApiError> {
        let request = self.authed(self.inner.client.get(self.url("/cart/mycart")), token);
        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart.unwrap_or_default())
    }

    #[instrument(skip_all, fields(items = items.len()))]
    async fn replace_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        let request = self
            .authed(self.inner.client.patch(self.url("/cart/updateCart")), token)
            .json(&CartProductsBody { products: items });
        self.send(request).await
    }

    #[instrument(skip_all, fields(items = items.len()))]
    async fn add_to_cart(&self, token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        let request = self
            .authed(self.inner.client.post(self.url("/cart/addToCart")), token)
            .json(&CartProductsBody { products: items });
        self.send(request).await
    }

    #[instrument(skip_all, fields(items = order.items.len()))]
    async fn create_order(&self, token: &BearerToken, order: &NewOrder) -> Result<OrderId, ApiError> {
        let request = self
            .authed(self.inner.client.post(self.url("/order/createOrder")), token)
            .json(order);
        let envelope: OrderEnvelope = self.send(request).await?;

        envelope
            .order
            .and_then(|order| order.order_id)
            .filter(|id| !id.as_str().is_empty())
            .ok_or_else(|| ApiError::Parse("order response has no orderId".to_string()))
    }

    #[instrument(skip(self, token), fields(order_id = %order_id))]
    async fn initiate_payment(
        &self,
        token: &BearerToken,
        order_id: &OrderId,
    ) -> Result<PaymentInitiation, ApiError> {
        let request = self
            .authed(
                self.inner.client.post(self.url("/order/initiatePayment")),
                token,
            )
            .json(&PaymentRequestBody { order_id });
        self.send(request).await
    }
}
