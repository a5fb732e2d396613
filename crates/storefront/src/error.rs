//! Unified error handling with Sentry integration.
//!
//! [`StorefrontError`] wraps every failure the storefront can surface.
//! [`StorefrontError::user_message`] is what a shopper sees;
//! [`StorefrontError::report`] logs the error and captures faults to Sentry.

use shophub_core::{AddressError, PhoneNumberError, QuantityError, UserId};
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::{CheckoutError, CheckoutErrorKind};
use crate::config::ConfigError;
use crate::session::AuthError;

/// Input rejected locally, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Phone(#[from] PhoneNumberError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("your cart is empty")]
    EmptyCart,
}

impl ValidationError {
    /// The form field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Phone(_) => "phoneNumber",
            Self::Address(_) => "address",
            Self::Quantity(_) => "quantity",
            Self::EmptyCart => "items",
        }
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Not signed in, or signed in with the wrong role.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Local input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Checkout ended in the failed state.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

impl StorefrontError {
    /// A message safe to show to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "The storefront is not configured correctly".to_string(),
            Self::Api(err) => err.user_message(),
            Self::Auth(err) => auth_message(err),
            Self::Validation(err) => capitalize(&err.to_string()),
            Self::Checkout(err) => match &err.kind {
                CheckoutErrorKind::Validation(e) => capitalize(&e.to_string()),
                CheckoutErrorKind::Auth(e) => auth_message(e),
                CheckoutErrorKind::OrderSubmission(e) => {
                    format!("Failed to place order: {}", e.user_message())
                }
                CheckoutErrorKind::PaymentInitiation { order_id, source } => format!(
                    "Order {order_id} was placed but payment could not be started ({}). \
                     You can retry payment from your orders page.",
                    source.user_message()
                ),
            },
        }
    }

    /// Whether this is a fault worth capturing, as opposed to a user mistake.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        match self {
            Self::Config(_) | Self::Api(_) => true,
            Self::Auth(_) | Self::Validation(_) => false,
            Self::Checkout(err) => matches!(
                err.kind,
                CheckoutErrorKind::OrderSubmission(_) | CheckoutErrorKind::PaymentInitiation { .. }
            ),
        }
    }

    /// Log the error, capturing faults to Sentry.
    ///
    /// Sentry capture is a no-op when Sentry is not initialized.
    pub fn report(&self) {
        if self.is_fault() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::MissingToken => "Please sign in to continue".to_string(),
        AuthError::AccessDenied { .. } => "You do not have access to this page".to_string(),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the account.
pub fn set_sentry_user(user_id: &UserId, name: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: name.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the account.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "665f1c")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
