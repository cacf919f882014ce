//! Role and status enums.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected buyer, seller or admin)")]
pub struct RoleError(pub String);

/// Marketplace role of a signed-in user.
///
/// Role decides which actions a view offers. It is not an authorization
/// boundary: the API enforces ownership and permissions on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses and purchases listings.
    #[default]
    Buyer,
    /// Creates and manages their own listings.
    Seller,
    /// Reviews users and moderates listings.
    Admin,
}

impl Role {
    /// Wire/attribute representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    /// Interpret a cached `custom:role` attribute.
    ///
    /// Missing or unrecognised values fall back to [`Role::Buyer`]; this is a
    /// silent default, not an error.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Roles a user may pick for themselves at sign-up.
    #[must_use]
    pub const fn is_self_assignable(&self) -> bool {
        matches!(self, Self::Buyer | Self::Seller)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}

/// Lifecycle status of a listing.
///
/// The API reports new listings as `unsold`; `active` is accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Available for purchase.
    #[default]
    #[serde(alias = "unsold")]
    Active,
    /// Hidden by an administrator.
    Removed,
    /// Purchased; no longer offered to buyers.
    Sold,
}

impl ListingStatus {
    /// Whether buyers may see this listing.
    #[must_use]
    pub const fn is_visible_to_buyers(&self) -> bool {
        !matches!(self, Self::Sold)
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Removed => write!(f, "removed"),
            Self::Sold => write!(f, "sold"),
        }
    }
}
