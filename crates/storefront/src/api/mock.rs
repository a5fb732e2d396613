//! Recording in-memory [`CommerceApi`] for tests.
//!
//! Keeps a server-side cart with replace/merge semantics, records every call
//! in order, and can be told to fail individual operations.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use shophub_core::{LineItem, OrderId, ProductId};

use super::types::{
    ApiMessage, NewOrder, PaymentInitiation, Product, ProductImage, RemoteCart, RemoteCartLine,
};
use super::{ApiError, CommerceApi};
use crate::session::BearerToken;

/// One recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchProduct(ProductId),
    FetchCart,
    ReplaceCart(Vec<LineItem>),
    AddToCart(Vec<LineItem>),
    CreateOrder(NewOrder),
    InitiatePayment(OrderId),
}

impl ApiCall {
    /// Whether this call touched the server cart or an order.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::FetchProduct(_))
    }
}

#[derive(Default)]
struct MockState {
    products: HashMap<ProductId, Product>,
    remote_cart: Vec<RemoteCartLine>,
    calls: Vec<ApiCall>,
    failing_products: HashSet<ProductId>,
    fail_fetch_cart: bool,
    fail_replace_cart: bool,
    fail_create_order: bool,
    fail_payment: bool,
    payment_url: Option<String>,
    orders_created: u32,
}

/// In-memory commerce API.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

/// A catalog product with the given name and whole-birr price.
#[must_use]
pub fn sample_product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Decimal::from(price),
        stock: 10,
        category: "General".to_string(),
        images: vec![ProductImage {
            image_url: format!("https://cdn.shophub.test/{id}.png"),
            image_id: None,
        }],
        description: String::new(),
        average_rating: None,
        total_rating: None,
    }
}

fn server_error(operation: &str) -> ApiError {
    ApiError::Api {
        status: 500,
        message: format!("{operation} failed"),
    }
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a product to the catalog.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.state().products.insert(product.id.clone(), product);
        self
    }

    /// Seed the server cart, including lines the client would consider invalid.
    #[must_use]
    pub fn with_remote_cart(self, lines: Vec<RemoteCartLine>) -> Self {
        self.state().remote_cart = lines;
        self
    }

    /// Make fetches of `id` fail with a server error.
    pub fn fail_product(&self, id: impl Into<ProductId>) {
        self.state().failing_products.insert(id.into());
    }

    pub fn set_fail_fetch_cart(&self, fail: bool) {
        self.state().fail_fetch_cart = fail;
    }

    pub fn set_fail_replace_cart(&self, fail: bool) {
        self.state().fail_replace_cart = fail;
    }

    pub fn set_fail_create_order(&self, fail: bool) {
        self.state().fail_create_order = fail;
    }

    pub fn set_fail_payment(&self, fail: bool) {
        self.state().fail_payment = fail;
    }

    /// The URL returned by payment initiation (`None` omits it).
    pub fn set_payment_url(&self, url: Option<&str>) {
        self.state().payment_url = url.map(str::to_string);
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Authenticated calls only (cart and order traffic).
    #[must_use]
    pub fn authenticated_calls(&self) -> Vec<ApiCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.is_authenticated())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// The server cart as raw lines.
    #[must_use]
    pub fn remote_cart(&self) -> Vec<RemoteCartLine> {
        self.state().remote_cart.clone()
    }

    /// Orders submitted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<NewOrder> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::CreateOrder(order) => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.state().calls.push(call);
    }
}

impl CommerceApi for MockApi {
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.record(ApiCall::FetchProduct(id.clone()));
        // Let sibling fetches interleave.
        tokio::task::yield_now().await;

        let state = self.state();
        if state.failing_products.contains(id) {
            return Err(server_error("fetch product"));
        }
        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    async fn fetch_cart(&self, _token: &BearerToken) -> Result<RemoteCart, ApiError> {
        self.record(ApiCall::FetchCart);
        tokio::task::yield_now().await;

        let state = self.state();
        if state.fail_fetch_cart {
            return Err(server_error("fetch cart"));
        }
        let total = state.remote_cart.iter().map(|line| line.quantity).sum();
        Ok(RemoteCart {
            products: state.remote_cart.clone(),
            total_items: Some(total),
        })
    }

    async fn replace_cart(&self, _token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        self.record(ApiCall::ReplaceCart(items.to_vec()));
        tokio::task::yield_now().await;

        let mut state = self.state();
        if state.fail_replace_cart {
            return Err(server_error("update cart"));
        }
        state.remote_cart = items.iter().map(RemoteCartLine::from).collect();
        Ok(ApiMessage {
            message: Some("Cart updated successfully".to_string()),
        })
    }

    async fn add_to_cart(&self, _token: &BearerToken, items: &[LineItem]) -> Result<ApiMessage, ApiError> {
        self.record(ApiCall::AddToCart(items.to_vec()));
        tokio::task::yield_now().await;

        let mut state = self.state();
        if state.fail_replace_cart {
            return Err(server_error("add to cart"));
        }
        for item in items {
            let added = i64::from(item.quantity.get());
            match state
                .remote_cart
                .iter_mut()
                .find(|line| line.product_id == item.product_id)
            {
                Some(line) => line.quantity += added,
                None => state.remote_cart.push(RemoteCartLine::from(item)),
            }
        }
        Ok(ApiMessage {
            message: Some("Product added to cart".to_string()),
        })
    }

    async fn create_order(&self, _token: &BearerToken, order: &NewOrder) -> Result<OrderId, ApiError> {
        self.record(ApiCall::CreateOrder(order.clone()));
        tokio::task::yield_now().await;

        let mut state = self.state();
        if state.fail_create_order {
            return Err(ApiError::Api {
                status: 400,
                message: "Order could not be created".to_string(),
            });
        }
        state.orders_created += 1;
        Ok(OrderId::new(format!("order-{}", state.orders_created)))
    }

    async fn initiate_payment(
        &self,
        _token: &BearerToken,
        order_id: &OrderId,
    ) -> Result<PaymentInitiation, ApiError> {
        self.record(ApiCall::InitiatePayment(order_id.clone()));
        tokio::task::yield_now().await;

        let state = self.state();
        if state.fail_payment {
            return Err(server_error("initiate payment"));
        }
        Ok(PaymentInitiation {
            payment_url: state.payment_url.clone(),
        })
    }
}
