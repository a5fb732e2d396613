//! Per-user storefront session.
//!
//! [`ShopSession`] ties together the account, the local cart, the
//! synchronizer and the checkout sequencer. Every cart mutation takes
//! `&mut self`, which serializes writes for one user; share a session across
//! tasks by wrapping it in a `tokio::sync::Mutex`.
//!
//! Mutations are optimistic: the local cart changes first, then one
//! synchronization cycle hydrates and pushes it. A failed push becomes an
//! error notice and the local change stays.

use shophub_core::{LineItem, ProductId, Quantity};
use tracing::info;

use crate::api::CommerceApi;
use crate::cart::{CartStore, CartSynchronizer, CartView, SyncReport};
use crate::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutSequencer};
use crate::error::{
    Result, StorefrontError, ValidationError, add_breadcrumb, clear_sentry_user, set_sentry_user,
};
use crate::notice::Notice;
use crate::session::{Area, AuthSession, BearerToken};

/// One shopper's storefront state.
pub struct ShopSession<A> {
    auth: AuthSession,
    store: CartStore,
    sync: CartSynchronizer<A>,
    notices: Vec<Notice>,
}

impl<A: CommerceApi> ShopSession<A> {
    #[must_use]
    pub fn new(api: A, mut auth: AuthSession) -> Self {
        auth.reconcile();
        if let Some(user) = auth.user() {
            set_sentry_user(&user.id, user.name.as_deref());
        }
        Self {
            auth,
            store: CartStore::new(),
            sync: CartSynchronizer::new(api),
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.store
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        self.sync.api()
    }

    /// Drop the account and its local cart.
    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        self.store = CartStore::new();
        clear_sentry_user();
    }

    /// Pending notices, oldest first.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Remove and return all pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Replace the local cart with the server cart.
    ///
    /// # Errors
    ///
    /// Fails when signed out, when the account is not a customer, or when the
    /// server cart cannot be fetched.
    pub async fn load(&mut self) -> Result<CartView> {
        let token = self.customer_token()?;
        match self.sync.load(&token, &mut self.store).await {
            Ok(view) => {
                info!(items = view.len(), "Cart loaded");
                Ok(view)
            }
            Err(e) => self.reject(e),
        }
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Fails only on the auth precondition; push failures become notices.
    pub async fn add_item(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: Quantity,
    ) -> Result<CartView> {
        let token = self.customer_token()?;
        let item = LineItem::new(product_id, quantity);
        add_breadcrumb("cart", "Added item", Some(&[("product_id", item.product_id.as_str())]));
        self.store.add_item(item);
        Ok(self.commit(&token, "Added to cart!").await)
    }

    /// Add through the server's merge endpoint, then reload the server cart.
    ///
    /// Used from product pages where the cart has not been loaded.
    ///
    /// # Errors
    ///
    /// Fails on the auth precondition or when either call fails.
    pub async fn quick_add(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: Quantity,
    ) -> Result<CartView> {
        let token = self.customer_token()?;
        let item = LineItem::new(product_id, quantity);
        let message = match self.sync.api().add_to_cart(&token, &[item]).await {
            Ok(ack) => ack.message.unwrap_or_else(|| "Added to cart!".to_string()),
            Err(e) => return self.reject(e),
        };
        match self.sync.load(&token, &mut self.store).await {
            Ok(view) => {
                self.notices.push(Notice::success(message));
                Ok(view)
            }
            Err(e) => self.reject(e),
        }
    }

    /// Set a line's quantity. Zero is rejected; an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Fails on the auth precondition or a zero quantity.
    pub async fn set_quantity(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: u32,
    ) -> Result<CartView> {
        let token = self.customer_token()?;
        let quantity = match Quantity::new(quantity) {
            Ok(quantity) => quantity,
            Err(e) => return self.reject(ValidationError::from(e)),
        };
        let product_id = product_id.into();
        Ok(self
            .mutate(&token, "Cart updated!", |store| {
                store.update_item(&product_id, quantity);
            })
            .await)
    }

    /// Add one unit to an existing line.
    ///
    /// # Errors
    ///
    /// Fails only on the auth precondition.
    pub async fn increment(&mut self, product_id: impl Into<ProductId>) -> Result<CartView> {
        let token = self.customer_token()?;
        let product_id = product_id.into();
        Ok(self
            .mutate(&token, "Cart updated!", |store| {
                if let Some(current) = store.get(&product_id).map(|item| item.quantity) {
                    store.update_item(&product_id, current.saturating_add(Quantity::ONE));
                }
            })
            .await)
    }

    /// Remove one unit from an existing line, stopping at one.
    ///
    /// # Errors
    ///
    /// Fails only on the auth precondition.
    pub async fn decrement(&mut self, product_id: impl Into<ProductId>) -> Result<CartView> {
        let token = self.customer_token()?;
        let product_id = product_id.into();
        Ok(self
            .mutate(&token, "Cart updated!", |store| {
                if let Some(lower) = store
                    .get(&product_id)
                    .and_then(|item| item.quantity.decremented())
                {
                    store.update_item(&product_id, lower);
                }
            })
            .await)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Fails only on the auth precondition.
    pub async fn remove_item(&mut self, product_id: impl Into<ProductId>) -> Result<CartView> {
        let token = self.customer_token()?;
        let product_id = product_id.into();
        Ok(self
            .mutate(&token, "Removed from cart", |store| {
                store.remove_item(&product_id);
            })
            .await)
    }

    /// Empty the cart on both sides.
    ///
    /// # Errors
    ///
    /// Fails only on the auth precondition.
    pub async fn clear(&mut self) -> Result<CartView> {
        let token = self.customer_token()?;
        self.store.clear_cart();
        Ok(self.commit(&token, "Cart cleared").await)
    }

    /// The current cart with product details, without pushing.
    pub async fn view(&self) -> CartView {
        self.sync.hydrate(self.store.items()).await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Order everything in the cart.
    ///
    /// # Errors
    ///
    /// Returns the checkout failure; see [`CheckoutSequencer::run`].
    pub async fn checkout(
        &mut self,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<CheckoutOutcome> {
        self.run_checkout(CheckoutRequest::cart(phone, address)).await
    }

    /// Order a single line straight from a product page, leaving the cart alone.
    ///
    /// # Errors
    ///
    /// Returns the checkout failure; see [`CheckoutSequencer::run`].
    pub async fn buy_now(
        &mut self,
        item: LineItem,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<CheckoutOutcome> {
        self.run_checkout(CheckoutRequest::express(item, phone, address))
            .await
    }

    async fn run_checkout(&mut self, request: CheckoutRequest) -> Result<CheckoutOutcome> {
        let result = CheckoutSequencer::new(&self.sync)
            .run(&self.auth, &mut self.store, request)
            .await;

        match result {
            Ok(outcome) => {
                self.notices.push(Notice::success(format!(
                    "Order {} placed successfully",
                    outcome.order_id
                )));
                Ok(outcome)
            }
            Err(e) => self.reject(e),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn customer_token(&mut self) -> Result<BearerToken> {
        match self.auth.require(Area::CustomerDashboard).cloned() {
            Ok(token) => Ok(token),
            Err(e) => self.reject(e),
        }
    }

    /// Apply a local change and sync if it changed anything.
    async fn mutate(
        &mut self,
        token: &BearerToken,
        success: &str,
        change: impl FnOnce(&mut CartStore),
    ) -> CartView {
        let before = self.store.revision();
        change(&mut self.store);
        if self.store.revision() == before && self.store.is_synced() {
            return self.view().await;
        }
        self.commit(token, success).await
    }

    /// Run one sync cycle and turn its outcome into a notice.
    async fn commit(&mut self, token: &BearerToken, success: &str) -> CartView {
        let SyncReport {
            view, push_error, ..
        } = self.sync.sync(token, &mut self.store).await;

        match push_error {
            None => self.notices.push(Notice::success(success)),
            Some(e) => {
                let err = StorefrontError::from(e);
                err.report();
                self.notices.push(Notice::error(format!(
                    "Cart could not be saved: {}",
                    err.user_message()
                )));
            }
        }
        view
    }

    /// Report `err`, queue it as a notice and return it.
    fn reject<T>(&mut self, err: impl Into<StorefrontError>) -> Result<T> {
        let err = err.into();
        err.report();
        self.notices.push(Notice::error(err.user_message()));
        Err(err)
    }
}
