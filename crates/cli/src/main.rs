//! ShopHub CLI - Drive a shopper's cart and checkout from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show a product
//! shophub product show 665f1c2a9b
//!
//! # Manage the cart
//! shophub cart show
//! shophub cart add 665f1c2a9b -q 2
//! shophub cart dec 665f1c2a9b
//!
//! # Order the cart
//! shophub checkout -p 0911223344 -a "Bole, Addis Ababa"
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPHUB_API_BASE_URL` - REST API base URL (required)
//! - `SHOPHUB_AUTH_TOKEN`, `SHOPHUB_USER_ID` - the signed-in account
//! - `SHOPHUB_USER_ROLE` - `user`, `vendor` or `admin` (default `user`)
//! - `SENTRY_DSN` - enables error reporting
//! - `RUST_LOG` - log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shophub_storefront::StorefrontConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shophub")]
#[command(author, version, about = "ShopHub shopping client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in account and where it lands
    Whoami,
    /// Browse products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Order everything in the cart
    Checkout {
        /// Ethiopian phone number for delivery
        #[arg(short, long)]
        phone: String,

        /// Delivery address
        #[arg(short, long)]
        address: String,
    },
    /// Order one product directly, leaving the cart alone
    BuyNow {
        /// Product ID
        product_id: String,

        /// Units to order
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Ethiopian phone number for delivery
        #[arg(short, long)]
        phone: String,

        /// Delivery address
        #[arg(short, long)]
        address: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Show product details
    Show {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with product details
    Show,
    /// Add a product, merging with an existing line
    Add {
        /// Product ID
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Use the server's merge endpoint instead of a full cart push
        #[arg(long)]
        quick: bool,
    },
    /// Set a line's quantity
    Set {
        /// Product ID
        product_id: String,

        /// New quantity (at least 1)
        quantity: u32,
    },
    /// Add one unit to a line
    Inc {
        /// Product ID
        product_id: String,
    },
    /// Remove one unit from a line, stopping at one
    Dec {
        /// Product ID
        product_id: String,
    },
    /// Remove a line
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shophub_cli=warn,shophub_storefront=warn".into());

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::debug!("Command failed: {e}");
        commands::print_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Whoami => commands::account::whoami(config)?,
        Commands::Product { action } => match action {
            ProductAction::Show { id } => commands::products::show(config, &id).await?,
        },
        Commands::Cart { action } => {
            let mut shop = commands::open_shop(config)?;
            match action {
                CartAction::Show => commands::cart::show(&mut shop).await?,
                CartAction::Add {
                    product_id,
                    quantity,
                    quick,
                } => commands::cart::add(&mut shop, &product_id, quantity, quick).await?,
                CartAction::Set {
                    product_id,
                    quantity,
                } => commands::cart::set(&mut shop, &product_id, quantity).await?,
                CartAction::Inc { product_id } => {
                    commands::cart::increment(&mut shop, &product_id).await?;
                }
                CartAction::Dec { product_id } => {
                    commands::cart::decrement(&mut shop, &product_id).await?;
                }
                CartAction::Remove { product_id } => {
                    commands::cart::remove(&mut shop, &product_id).await?;
                }
                CartAction::Clear => commands::cart::clear(&mut shop).await?,
            }
        }
        Commands::Checkout { phone, address } => {
            let mut shop = commands::open_shop(config)?;
            commands::checkout::cart(&mut shop, &phone, &address).await?;
        }
        Commands::BuyNow {
            product_id,
            quantity,
            phone,
            address,
        } => {
            let mut shop = commands::open_shop(config)?;
            commands::checkout::buy_now(&mut shop, &product_id, quantity, &phone, &address)
                .await?;
        }
    }
    Ok(())
}
