//! Account roles.

use serde::{Deserialize, Serialize};

/// The role an account signs in with.
///
/// Each role owns one area of the site: customers shop from the dashboard,
/// vendors manage their catalog, admins oversee the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A shopper. The API calls this role `user`.
    #[serde(rename = "user")]
    Customer,
    /// A seller managing products and orders.
    Vendor,
    /// Platform administrator.
    Admin,
}

impl UserRole {
    /// The page a signed-in account of this role lands on.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Customer => "/dashboard",
            Self::Vendor => "/vendor",
            Self::Admin => "/admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "user"),
            Self::Vendor => write!(f, "vendor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Customer, UserRole::Vendor, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&UserRole::Customer).unwrap(), "\"user\"");
        let vendor: UserRole = serde_json::from_str("\"vendor\"").unwrap();
        assert_eq!(vendor, UserRole::Vendor);
    }
}
