//! Account commands.

use std::io::{self, Write};

use shophub_storefront::StorefrontConfig;
use shophub_storefront::session::{Access, Area, AuthSession, SIGN_IN_PATH};

use super::CliError;

/// Print who the configured credentials belong to and where they may go.
pub fn whoami(config: &StorefrontConfig) -> Result<(), CliError> {
    let auth = AuthSession::from_credentials(config.credentials.as_ref());
    let mut out = io::stdout().lock();

    let Some(user) = auth.user() else {
        writeln!(out, "Not signed in. Sign in at {SIGN_IN_PATH}")?;
        return Ok(());
    };

    writeln!(
        out,
        "Signed in as {} ({})",
        user.name.as_deref().unwrap_or(user.id.as_str()),
        user.role
    )?;
    writeln!(out, "Home: {}", user.role.landing_path())?;
    match auth.authorize(Area::CustomerDashboard) {
        Access::Granted => writeln!(out, "Cart and checkout: available")?,
        Access::Redirect(path) => {
            writeln!(out, "Cart and checkout: not available, redirected to {path}")?;
        }
    }
    Ok(())
}
