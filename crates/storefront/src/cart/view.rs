//! Rendering data for a cart: line items joined with product details.
//!
//! Display fields never flow back into the authoritative cart; a view is
//! rebuilt from `{productId, quantity}` pairs on every hydration.

use shophub_core::{CurrencyCode, LineItem, Price, ProductId, Quantity};

use crate::api::{ApiError, Product};

/// Image shown when a product has none or its details could not be loaded.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

/// Name shown for a line whose product details could not be loaded.
pub const UNAVAILABLE_PRODUCT_NAME: &str = "Unavailable product";

/// One cart line ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub name: String,
    /// `None` when the product details could not be loaded.
    pub unit_price: Option<Price>,
    pub image: String,
    pub stock: Option<i64>,
    /// Why the product details are missing, if they are.
    pub detail_error: Option<String>,
}

impl CartItemView {
    pub(crate) fn from_product(item: &LineItem, product: &Product) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            name: product.name.clone(),
            unit_price: Some(product.unit_price()),
            image: product
                .primary_image()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            stock: Some(product.stock),
            detail_error: None,
        }
    }

    pub(crate) fn placeholder(item: &LineItem, error: &ApiError) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            name: UNAVAILABLE_PRODUCT_NAME.to_string(),
            unit_price: None,
            image: PLACEHOLDER_IMAGE.to_string(),
            stock: None,
            detail_error: Some(error.to_string()),
        }
    }

    /// Price of the whole line, if the unit price is known.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.map(|price| price.times(self.quantity))
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.detail_error.is_some()
    }

    /// Whether more units are in the cart than the catalog has in stock.
    #[must_use]
    pub fn exceeds_stock(&self) -> bool {
        self.stock
            .is_some_and(|stock| i64::from(self.quantity.get()) > stock)
    }
}

/// A hydrated cart, in cart order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
}

impl CartView {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItemView> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Total of all lines with a known price. Unavailable lines count as zero.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items
            .iter()
            .filter_map(CartItemView::line_total)
            .fold(Price::zero(CurrencyCode::ETB), |total, line| {
                total.checked_add(&line).unwrap_or(total)
            })
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Number of lines rendered with placeholder data.
    #[must_use]
    pub fn unavailable_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_placeholder()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::mock::sample_product;

    fn item(id: &str, quantity: u32) -> LineItem {
        LineItem::new(id, Quantity::new(quantity).unwrap())
    }

    #[test]
    fn test_subtotal_skips_unavailable_lines() {
        let view = CartView {
            items: vec![
                CartItemView::from_product(&item("a", 2), &sample_product("a", "Coffee", 150)),
                CartItemView::placeholder(&item("b", 1), &ApiError::NotFound("gone".to_string())),
                CartItemView::from_product(&item("c", 1), &sample_product("c", "Honey", 300)),
            ],
        };

        assert_eq!(view.subtotal().amount, Decimal::from(600));
        assert_eq!(view.total_quantity(), 4);
        assert_eq!(view.unavailable_count(), 1);
    }

    #[test]
    fn test_placeholder_fields() {
        let view = CartItemView::placeholder(
            &item("b", 3),
            &ApiError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            },
        );
        assert_eq!(view.name, UNAVAILABLE_PRODUCT_NAME);
        assert_eq!(view.image, PLACEHOLDER_IMAGE);
        assert_eq!(view.quantity.get(), 3);
        assert!(view.unit_price.is_none());
        assert!(view.line_total().is_none());
        assert!(view.is_placeholder());
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let mut product = sample_product("a", "Coffee", 150);
        product.images.clear();
        let view = CartItemView::from_product(&item("a", 1), &product);
        assert_eq!(view.image, PLACEHOLDER_IMAGE);
        assert!(!view.is_placeholder());
    }

    #[test]
    fn test_exceeds_stock() {
        let mut product = sample_product("a", "Coffee", 150);
        product.stock = 2;
        assert!(!CartItemView::from_product(&item("a", 2), &product).exceeds_stock());
        assert!(CartItemView::from_product(&item("a", 3), &product).exceeds_stock());
    }
}
