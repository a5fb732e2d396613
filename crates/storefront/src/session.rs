//! Signed-in account state and the role-based page guard.
//!
//! Every cart and order call obtains its bearer token through
//! [`AuthSession::token`], so a missing token fails before any request is
//! built.

use secrecy::{ExposeSecret, SecretString};
use shophub_core::{UserId, UserRole};
use thiserror::Error;

use crate::config::Credentials;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

/// Authentication failures raised before a request is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token is available for an authenticated call.
    #[error("not signed in")]
    MissingToken,

    /// The signed-in account may not use this part of the storefront.
    #[error("access denied, redirect to {redirect}")]
    AccessDenied {
        /// Page the visitor should be sent to instead.
        redirect: String,
    },
}

/// A bearer token issued by the auth service.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl From<SecretString> for BearerToken {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// The account a session acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub name: Option<String>,
    pub role: UserRole,
}

/// Areas of the site guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Shopping, cart and checkout.
    CustomerDashboard,
    /// Vendor product and order management.
    VendorDashboard,
    /// Platform administration.
    AdminDashboard,
}

impl Area {
    /// The role allowed into this area.
    #[must_use]
    pub const fn required_role(self) -> UserRole {
        match self {
            Self::CustomerDashboard => UserRole::Customer,
            Self::VendorDashboard => UserRole::Vendor,
            Self::AdminDashboard => UserRole::Admin,
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(String),
}

/// Authentication state for one visitor.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    user: Option<SessionUser>,
    token: Option<BearerToken>,
}

impl AuthSession {
    /// A signed-out session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session for `user` holding `token`.
    #[must_use]
    pub const fn signed_in(user: SessionUser, token: BearerToken) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
        }
    }

    /// Restore a session from possibly partial stored state.
    ///
    /// A token without a user (or a user without a token) cannot be trusted,
    /// so both halves are dropped.
    #[must_use]
    pub fn restore(user: Option<SessionUser>, token: Option<BearerToken>) -> Self {
        let mut session = Self { user, token };
        session.reconcile();
        session
    }

    /// Build the session described by configured credentials.
    #[must_use]
    pub fn from_credentials(credentials: Option<&Credentials>) -> Self {
        credentials.map_or_else(Self::anonymous, |c| {
            Self::signed_in(
                SessionUser {
                    id: c.user_id.clone(),
                    name: c.name.clone(),
                    role: c.role,
                },
                BearerToken::from(c.token.clone()),
            )
        })
    }

    /// Clear inconsistent state. Returns `true` if anything was dropped.
    pub fn reconcile(&mut self) -> bool {
        if self.user.is_some() != self.token.is_some() {
            tracing::warn!(
                has_user = self.user.is_some(),
                has_token = self.token.is_some(),
                "Inconsistent auth state, signing out"
            );
            self.sign_out();
            return true;
        }
        false
    }

    pub fn sign_out(&mut self) {
        self.user = None;
        self.token = None;
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// The bearer token for authenticated calls.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] when signed out.
    pub fn token(&self) -> Result<&BearerToken, AuthError> {
        self.token.as_ref().ok_or(AuthError::MissingToken)
    }

    /// Check whether this session may enter `area`.
    ///
    /// Signed-out visitors go to the sign-in page; signed-in accounts with the
    /// wrong role go to their own landing page.
    #[must_use]
    pub fn authorize(&self, area: Area) -> Access {
        match (&self.user, &self.token) {
            (Some(user), Some(_)) if user.role == area.required_role() => Access::Granted,
            (Some(user), Some(_)) => Access::Redirect(user.role.landing_path().to_string()),
            _ => Access::Redirect(SIGN_IN_PATH.to_string()),
        }
    }

    /// The token for a call made on behalf of `area`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] when signed out and
    /// [`AuthError::AccessDenied`] with the account's landing page when the
    /// role does not match.
    pub fn require(&self, area: Area) -> Result<&BearerToken, AuthError> {
        let token = self.token()?;
        match self.authorize(area) {
            Access::Granted => Ok(token),
            Access::Redirect(redirect) => Err(AuthError::AccessDenied { redirect }),
        }
    }
}
