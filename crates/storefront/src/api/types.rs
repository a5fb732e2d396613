//! Wire types for the commerce REST API.
//!
//! Field names follow the API's camelCase JSON. Types that only exist to
//! unwrap a response envelope are crate-private.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shophub_core::{
    CurrencyCode, DeliveryAddress, LineItem, OrderId, PhoneNumber, Price, ProductId, Quantity,
};

// =============================================================================
// Products
// =============================================================================

/// Product projection returned by `GET /products/singleProduct/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    /// Unit price in birr.
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_rating: Option<u32>,
}

impl Product {
    /// The unit price. The catalog is priced in birr only.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::ETB)
    }

    /// URL of the first image, if the product has one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .first()
            .map(|image| image.image_url.as_str())
            .filter(|url| !url.is_empty())
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub image_url: String,
    #[serde(default)]
    pub image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

// =============================================================================
// Cart
// =============================================================================

/// The server-held cart as returned by `GET /cart/mycart`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub products: Vec<RemoteCartLine>,
    #[serde(default)]
    pub total_items: Option<i64>,
}

/// One line of the server cart.
///
/// The server does not guarantee positive quantities, so the raw count is kept
/// until [`RemoteCartLine::to_line_item`] checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl RemoteCartLine {
    /// The line as a cart entry, or `None` if its quantity is not positive.
    #[must_use]
    pub fn to_line_item(&self) -> Option<LineItem> {
        let quantity = u32::try_from(self.quantity).ok()?;
        let quantity = Quantity::new(quantity).ok()?;
        Some(LineItem::new(self.product_id.clone(), quantity))
    }
}

impl From<&LineItem> for RemoteCartLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: i64::from(item.quantity.get()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartEnvelope {
    #[serde(default)]
    pub cart: Option<RemoteCart>,
}

/// Body of `PATCH /cart/updateCart` and `POST /cart/addToCart`.
#[derive(Debug, Serialize)]
pub(crate) struct CartProductsBody<'a> {
    pub products: &'a [LineItem],
}

/// Acknowledgement body carried by mutating endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Orders & payment
// =============================================================================

/// Body of `POST /order/createOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<LineItem>,
    pub phone_number: PhoneNumber,
    pub address: DeliveryAddress,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    #[serde(default)]
    pub order: Option<CreatedOrder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedOrder {
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentRequestBody<'a> {
    pub order_id: &'a OrderId,
}

/// Response of `POST /order/initiatePayment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiation {
    #[serde(default)]
    pub payment_url: Option<String>,
}

impl PaymentInitiation {
    /// The hosted payment page, treating an empty URL as absent.
    #[must_use]
    pub fn payment_url(&self) -> Option<&str> {
        self.payment_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
