//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod products;

use std::io::{self, Write};

use shophub_core::QuantityError;
use shophub_storefront::api::ApiError;
use shophub_storefront::cart::CartView;
use shophub_storefront::error::ValidationError;
use shophub_storefront::notice::Notice;
use shophub_storefront::{ApiClient, AuthSession, ShopSession, StorefrontConfig, StorefrontError};
use thiserror::Error;

pub type Shop = ShopSession<ApiClient>;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A storefront failure not yet shown to the user.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// A storefront failure already printed as a notice.
    #[error("{0}")]
    Noticed(String),

    /// Writing to the terminal failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<QuantityError> for CliError {
    fn from(err: QuantityError) -> Self {
        Self::Storefront(ValidationError::from(err).into())
    }
}

/// Build a session for the account configured in the environment.
pub fn open_shop(config: &StorefrontConfig) -> Result<Shop, CliError> {
    let client = ApiClient::new(&config.api)?;
    let auth = AuthSession::from_credentials(config.credentials.as_ref());
    Ok(ShopSession::new(client, auth))
}

/// Print the session's notices and fold an already-noticed failure.
pub fn settle<T>(shop: &mut Shop, result: shophub_storefront::Result<T>) -> Result<T, CliError> {
    let notices = shop.take_notices();
    let mut out = io::stdout().lock();
    for notice in &notices {
        writeln!(out, "{notice}")?;
    }

    result.map_err(|e| {
        if notices.iter().any(Notice::is_error) {
            CliError::Noticed(e.to_string())
        } else {
            CliError::Storefront(e)
        }
    })
}

pub fn print_view(view: &CartView) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if view.is_empty() {
        return writeln!(out, "Your cart is empty");
    }

    for item in &view.items {
        let total = item
            .line_total()
            .map_or_else(|| "-".to_string(), |price| price.to_string());
        write!(
            out,
            "{:>4} x {} ({})  {}",
            item.quantity, item.name, item.product_id, total
        )?;
        if let Some(reason) = &item.detail_error {
            write!(out, "  [details unavailable: {reason}]")?;
        } else if item.exceeds_stock() {
            write!(out, "  [only {} in stock]", item.stock.unwrap_or_default())?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "Subtotal: {} ({} items)",
        view.subtotal(),
        view.total_quantity()
    )?;
    let unavailable = view.unavailable_count();
    if unavailable > 0 {
        writeln!(out, "{unavailable} line(s) could not be priced")?;
    }
    Ok(())
}

/// Show a failure that no notice has covered yet.
pub fn print_error(err: &CliError) {
    let message = match err {
        CliError::Storefront(e) => {
            e.report();
            format!("[error] {}", e.user_message())
        }
        CliError::Noticed(_) => return,
        CliError::Output(e) => format!("[error] {e}"),
    };
    let _ = writeln!(io::stderr(), "{message}");
}
