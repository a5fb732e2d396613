//! Reconciles the local cart with the server cart.
//!
//! One synchronization cycle is:
//!
//! 1. **Fetching details** - every line's product is fetched concurrently;
//!    each fetch settles independently and a failure only affects its own line
//! 2. **Pushing** - once all fetches have settled, the full local cart is
//!    written to the server with replace semantics
//! 3. **Converged** - the store records the pushed revision. Nothing is read
//!    back, so convergence is optimistic.
//!
//! Cycles are not queued; the last push to reach the server wins. Callers
//! serialize cycles per user by holding `&mut CartStore`.

use futures::future::join_all;
use shophub_core::LineItem;
use tracing::{debug, instrument, warn};

use super::store::CartStore;
use super::view::{CartItemView, CartView};
use crate::api::{ApiError, CommerceApi};
use crate::session::BearerToken;

/// Result of one synchronization cycle.
#[derive(Debug)]
pub struct SyncReport {
    /// The hydrated cart, one entry per line.
    pub view: CartView,
    /// Store revision that was pushed.
    pub revision: u64,
    /// Why the push failed, if it did. The local cart is kept either way.
    pub push_error: Option<ApiError>,
}

impl SyncReport {
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.push_error.is_none()
    }
}

/// Keeps a [`CartStore`] and the server cart convergent.
pub struct CartSynchronizer<A> {
    api: A,
}

impl<A: CommerceApi> CartSynchronizer<A> {
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the server cart as line items.
    ///
    /// Lines with a non-positive quantity are dropped. A user with no cart yet
    /// (404) has an empty one.
    ///
    /// # Errors
    ///
    /// Returns any other API failure.
    #[instrument(skip_all)]
    pub async fn fetch(&self, token: &BearerToken) -> Result<Vec<LineItem>, ApiError> {
        let remote = match self.api.fetch_cart(token).await {
            Ok(remote) => remote,
            Err(ApiError::NotFound(message)) => {
                debug!(message = %message, "No server cart yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let items = remote
            .products
            .iter()
            .filter_map(|line| {
                let item = line.to_line_item();
                if item.is_none() {
                    warn!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        "Dropping server cart line with non-positive quantity"
                    );
                }
                item
            })
            .collect();

        Ok(items)
    }

    /// Join `items` with their product details.
    ///
    /// All fetches run concurrently and every line appears in the result; a
    /// line whose fetch failed carries placeholder fields.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn hydrate(&self, items: &[LineItem]) -> CartView {
        let fetches = items.iter().map(|item| async move {
            let detail = self.api.fetch_product(&item.product_id).await;
            (item, detail)
        });

        let items = join_all(fetches)
            .await
            .into_iter()
            .map(|(item, detail)| match detail {
                Ok(product) => CartItemView::from_product(item, &product),
                Err(e) => {
                    warn!(
                        product_id = %item.product_id,
                        error = %e,
                        "Failed to fetch product details"
                    );
                    CartItemView::placeholder(item, &e)
                }
            })
            .collect();

        CartView { items }
    }

    /// Overwrite the server cart with exactly `items`. Pushing the same set
    /// twice leaves the server in the same state.
    ///
    /// # Errors
    ///
    /// Returns the API failure; nothing is retried.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn push(&self, token: &BearerToken, items: &[LineItem]) -> Result<(), ApiError> {
        self.api.replace_cart(token, items).await?;
        debug!("Server cart replaced");
        Ok(())
    }

    /// Replace the local cart with the server cart and hydrate it.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; the store is left untouched in that case.
    pub async fn load(&self, token: &BearerToken, store: &mut CartStore) -> Result<CartView, ApiError> {
        let items = self.fetch(token).await?;
        store.set_cart(items);
        store.mark_synced(store.revision());
        Ok(self.hydrate(store.items()).await)
    }

    /// Run one cycle: hydrate the current contents, then push them.
    ///
    /// A failed push is reported, not returned, and the local cart is not
    /// rolled back.
    pub async fn sync(&self, token: &BearerToken, store: &mut CartStore) -> SyncReport {
        let snapshot = store.snapshot();
        let revision = store.revision();

        let view = self.hydrate(&snapshot).await;

        let push_error = match self.push(token, &snapshot).await {
            Ok(()) => {
                store.mark_synced(revision);
                None
            }
            Err(e) => {
                warn!(error = %e, revision, "Cart push failed, keeping local cart");
                Some(e)
            }
        };

        SyncReport {
            view,
            revision,
            push_error,
        }
    }
}
