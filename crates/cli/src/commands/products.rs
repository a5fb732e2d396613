//! Product commands.

use std::io::{self, Write};

use shophub_core::ProductId;
use shophub_storefront::{ApiClient, CommerceApi, StorefrontConfig};

use super::CliError;

pub async fn show(config: &StorefrontConfig, id: &str) -> Result<(), CliError> {
    let client = ApiClient::new(&config.api)?;
    let product = client.fetch_product(&ProductId::new(id)).await?;

    let mut out = io::stdout().lock();
    writeln!(out, "{} ({})", product.name, product.id)?;
    writeln!(out, "Price:    {}", product.unit_price())?;
    writeln!(out, "Category: {}", product.category)?;
    if product.in_stock() {
        writeln!(out, "Stock:    {}", product.stock)?;
    } else {
        writeln!(out, "Stock:    out of stock")?;
    }
    if let (Some(average), Some(count)) = (product.average_rating, product.total_rating) {
        writeln!(out, "Rating:   {average:.1} ({count} reviews)")?;
    }
    if let Some(image) = product.primary_image() {
        writeln!(out, "Image:    {image}")?;
    }
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }
    Ok(())
}
