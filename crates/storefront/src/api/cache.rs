//! Product detail memoization.
//!
//! Products are immutable reference data for the length of a cart session,
//! so repeated hydrations reuse the first successful fetch until the TTL
//! expires. Failed fetches are never cached.

use std::time::Duration;

use moka::future::Cache;
use shophub_core::ProductId;

use super::types::Product;

/// In-memory product cache keyed by product ID.
#[derive(Clone)]
pub struct ProductCache {
    inner: Cache<ProductId, Product>,
}

impl ProductCache {
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        self.inner.get(id).await
    }

    pub async fn insert(&self, product: Product) {
        self.inner.insert(product.id.clone(), product).await;
    }
}
