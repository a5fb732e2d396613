//! Checkout state machine.
//!
//! ```text
//! Idle -> Validating -> SubmittingOrder -> ClearingCart -> InitiatingPayment -> Redirecting
//!              \               \                                  \
//!               +---------------+----------------------------------+--> Failed
//! ```
//!
//! `Validating` never touches the network. `SubmittingOrder` first pushes a
//! cart checkout's snapshot to the server cart, then creates the order.
//!
//! Steps run strictly in sequence. Order creation is the commit point: the
//! cart is cleared only after the server confirmed the order, and a payment
//! failure afterwards rolls nothing back. The order stays unpaid on the server
//! and the shopper retries payment by hand.
//!
//! An express purchase orders a single ad hoc line and never touches the
//! persisted cart, so it skips `ClearingCart`.

use std::fmt;

use shophub_core::{DeliveryAddress, LineItem, OrderId, PhoneNumber};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CommerceApi, NewOrder};
use crate::cart::{CartStore, CartSynchronizer};
use crate::error::{ValidationError, add_breadcrumb};
use crate::session::{Area, AuthError, AuthSession};

/// States of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStage {
    Idle,
    Validating,
    SubmittingOrder,
    ClearingCart,
    InitiatingPayment,
    Redirecting,
    Failed,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::SubmittingOrder => "submitting_order",
            Self::ClearingCart => "clearing_cart",
            Self::InitiatingPayment => "initiating_payment",
            Self::Redirecting => "redirecting",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What is being bought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutSource {
    /// Everything in the cart.
    Cart,
    /// A single line from a product page, bypassing the cart.
    Express(LineItem),
}

/// Raw checkout form input.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub source: CheckoutSource,
    pub phone: String,
    pub address: String,
}

impl CheckoutRequest {
    #[must_use]
    pub fn cart(phone: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            source: CheckoutSource::Cart,
            phone: phone.into(),
            address: address.into(),
        }
    }

    #[must_use]
    pub fn express(item: LineItem, phone: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            source: CheckoutSource::Express(item),
            phone: phone.into(),
            address: address.into(),
        }
    }
}

/// Where the shopper goes after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Hosted payment page (external handoff).
    PaymentPage(String),
    /// Order status page, used when no payment URL was returned.
    OrderStatus(String),
}

impl Redirect {
    #[must_use]
    pub fn order_status(order_id: &OrderId) -> Self {
        Self::OrderStatus(format!("/orders/{order_id}"))
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::PaymentPage(url) | Self::OrderStatus(url) => url,
        }
    }
}

/// A checkout that reached `Redirecting`.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub redirect: Redirect,
    /// Every state visited, starting with `Idle`.
    pub trace: Vec<CheckoutStage>,
    /// Whether the local cart was emptied.
    pub cart_cleared: bool,
    /// Whether the server cart was emptied. A failed remote clear leaves the
    /// store unsynced so the next push retries it.
    pub remote_cart_cleared: bool,
}

/// Why a checkout ended in `Failed`.
#[derive(Debug, Error)]
pub enum CheckoutErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The order was not created; the cart is untouched.
    #[error("order submission failed: {0}")]
    OrderSubmission(#[source] ApiError),

    /// The order exists but no payment was started.
    #[error("payment initiation failed for order {order_id}: {source}")]
    PaymentInitiation { order_id: OrderId, source: ApiError },
}

/// A checkout that ended in `Failed`.
#[derive(Debug, Error)]
#[error("checkout failed: {kind}")]
pub struct CheckoutError {
    #[source]
    pub kind: CheckoutErrorKind,
    /// Every state visited, ending with `Failed`.
    pub trace: Vec<CheckoutStage>,
    /// Whether the local cart was emptied before the failure.
    pub cart_cleared: bool,
}

impl CheckoutError {
    /// The order left unpaid, if the failure came after order creation.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        match &self.kind {
            CheckoutErrorKind::PaymentInitiation { order_id, .. } => Some(order_id),
            _ => None,
        }
    }

    /// The state that failed.
    #[must_use]
    pub fn failed_during(&self) -> CheckoutStage {
        self.trace
            .iter()
            .rev()
            .copied()
            .find(|stage| *stage != CheckoutStage::Failed)
            .unwrap_or(CheckoutStage::Idle)
    }
}

/// Drives one checkout attempt from `Idle` to `Redirecting` or `Failed`.
///
/// Single use: [`CheckoutSequencer::run`] consumes it.
pub struct CheckoutSequencer<'a, A> {
    sync: &'a CartSynchronizer<A>,
    trace: Vec<CheckoutStage>,
}

impl<'a, A: CommerceApi> CheckoutSequencer<'a, A> {
    #[must_use]
    pub fn new(sync: &'a CartSynchronizer<A>) -> Self {
        Self {
            sync,
            trace: vec![CheckoutStage::Idle],
        }
    }

    /// The current state.
    #[must_use]
    pub fn stage(&self) -> CheckoutStage {
        self.trace.last().copied().unwrap_or(CheckoutStage::Idle)
    }

    fn enter(&mut self, next: CheckoutStage) {
        debug!(from = %self.stage(), to = %next, "Checkout transition");
        add_breadcrumb("checkout", &next.to_string(), None);
        self.trace.push(next);
    }

    fn fail(mut self, kind: CheckoutErrorKind, cart_cleared: bool) -> CheckoutError {
        warn!(stage = %self.stage(), error = %kind, "Checkout failed");
        self.enter(CheckoutStage::Failed);
        CheckoutError {
            kind,
            trace: self.trace,
            cart_cleared,
        }
    }

    /// Run the checkout.
    ///
    /// `store` is read for a cart checkout and cleared once the order exists;
    /// an express purchase leaves it alone.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] when any step fails. Validation and auth
    /// failures happen before any network call.
    pub async fn run(
        mut self,
        auth: &AuthSession,
        store: &mut CartStore,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let sync = self.sync;
        self.enter(CheckoutStage::Validating);

        let token = match auth.require(Area::CustomerDashboard) {
            Ok(token) => token,
            Err(e) => return Err(self.fail(e.into(), false)),
        };
        let (items, from_cart) = match request.source {
            CheckoutSource::Cart => (store.snapshot(), true),
            CheckoutSource::Express(item) => (vec![item], false),
        };
        let order = match validate(items, &request.phone, &request.address) {
            Ok(order) => order,
            Err(e) => return Err(self.fail(e.into(), false)),
        };

        self.enter(CheckoutStage::SubmittingOrder);
        // Persist what is about to be ordered. The order carries its own
        // snapshot, so a failed push does not block it.
        if from_cart {
            let revision = store.revision();
            match sync.push(token, &order.items).await {
                Ok(()) => store.mark_synced(revision),
                Err(e) => warn!(error = %e, "Pre-checkout cart push failed, continuing"),
            }
        }

        let order_id = match sync.api().create_order(token, &order).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(CheckoutErrorKind::OrderSubmission(e), false)),
        };
        info!(order_id = %order_id, items = order.items.len(), "Order created");

        let mut remote_cart_cleared = false;
        if from_cart {
            self.enter(CheckoutStage::ClearingCart);
            match sync.push(token, &[]).await {
                Ok(()) => remote_cart_cleared = true,
                Err(e) => warn!(
                    order_id = %order_id,
                    error = %e,
                    "Failed to clear server cart after order, will retry on next sync"
                ),
            }
            store.clear_cart();
            if remote_cart_cleared {
                store.mark_synced(store.revision());
            }
        }

        self.enter(CheckoutStage::InitiatingPayment);
        let payment = match sync.api().initiate_payment(token, &order_id).await {
            Ok(payment) => payment,
            Err(source) => {
                return Err(self.fail(
                    CheckoutErrorKind::PaymentInitiation { order_id, source },
                    from_cart,
                ));
            }
        };

        self.enter(CheckoutStage::Redirecting);
        let redirect = payment.payment_url().map_or_else(
            || Redirect::order_status(&order_id),
            |url| Redirect::PaymentPage(url.to_string()),
        );
        info!(order_id = %order_id, redirect = %redirect.target(), "Checkout complete");

        Ok(CheckoutOutcome {
            order_id,
            redirect,
            trace: self.trace,
            cart_cleared: from_cart,
            remote_cart_cleared,
        })
    }
}

/// Check the form fields and the snapshot without touching the network.
fn validate(items: Vec<LineItem>, phone: &str, address: &str) -> Result<NewOrder, ValidationError> {
    let phone_number = PhoneNumber::parse(phone)?;
    let address = DeliveryAddress::parse(address)?;
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    Ok(NewOrder {
        items,
        phone_number,
        address,
    })
}
