//! Checkout commands.

use std::io::{self, Write};

use shophub_core::{LineItem, Quantity};
use shophub_storefront::checkout::{CheckoutOutcome, Redirect};

use super::{CliError, Shop, settle};

pub async fn cart(shop: &mut Shop, phone: &str, address: &str) -> Result<(), CliError> {
    super::cart::load(shop).await?;
    let result = shop.checkout(phone, address).await;
    let outcome = settle(shop, result)?;
    print_outcome(&outcome)?;
    Ok(())
}

pub async fn buy_now(
    shop: &mut Shop,
    product_id: &str,
    quantity: u32,
    phone: &str,
    address: &str,
) -> Result<(), CliError> {
    let item = LineItem::new(product_id, Quantity::new(quantity)?);
    let result = shop.buy_now(item, phone, address).await;
    let outcome = settle(shop, result)?;
    print_outcome(&outcome)?;
    Ok(())
}

fn print_outcome(outcome: &CheckoutOutcome) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "Order: {}", outcome.order_id)?;
    match &outcome.redirect {
        Redirect::PaymentPage(url) => writeln!(out, "Complete payment at: {url}")?,
        Redirect::OrderStatus(path) => writeln!(out, "Track your order at: {path}")?,
    }
    if outcome.cart_cleared && !outcome.remote_cart_cleared {
        writeln!(
            out,
            "Note: the server cart could not be emptied, run `shophub cart clear` to empty it"
        )?;
    }
    Ok(())
}
