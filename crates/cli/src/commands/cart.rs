//! Cart commands.
//!
//! Each invocation is a fresh session, so mutations load the server cart
//! first; pushing an unloaded cart would overwrite the server's.

use shophub_core::Quantity;

use super::{CliError, Shop, print_view, settle};

pub async fn show(shop: &mut Shop) -> Result<(), CliError> {
    let result = shop.load().await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn add(
    shop: &mut Shop,
    product_id: &str,
    quantity: u32,
    quick: bool,
) -> Result<(), CliError> {
    let quantity = Quantity::new(quantity)?;
    let result = if quick {
        shop.quick_add(product_id, quantity).await
    } else {
        load(shop).await?;
        shop.add_item(product_id, quantity).await
    };
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn set(shop: &mut Shop, product_id: &str, quantity: u32) -> Result<(), CliError> {
    load(shop).await?;
    let result = shop.set_quantity(product_id, quantity).await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn increment(shop: &mut Shop, product_id: &str) -> Result<(), CliError> {
    load(shop).await?;
    let result = shop.increment(product_id).await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn decrement(shop: &mut Shop, product_id: &str) -> Result<(), CliError> {
    load(shop).await?;
    let result = shop.decrement(product_id).await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn remove(shop: &mut Shop, product_id: &str) -> Result<(), CliError> {
    load(shop).await?;
    let result = shop.remove_item(product_id).await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

pub async fn clear(shop: &mut Shop) -> Result<(), CliError> {
    load(shop).await?;
    let result = shop.clear().await;
    let view = settle(shop, result)?;
    print_view(&view)?;
    Ok(())
}

/// Mirror the server cart locally without printing it.
pub(super) async fn load(shop: &mut Shop) -> Result<(), CliError> {
    let result = shop.load().await.map(drop);
    settle(shop, result)
}
