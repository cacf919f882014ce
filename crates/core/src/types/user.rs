//! User attribute map and admin user directory entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// Attribute names used by the identity provider.
pub mod attr {
    /// Subject (stable user id).
    pub const SUB: &str = "sub";
    /// Email address.
    pub const EMAIL: &str = "email";
    /// Custom marketplace role.
    pub const ROLE: &str = "custom:role";
}

/// Identity-provider attributes of the signed-in user, cached locally.
///
/// Stored as the raw name → value map the provider returns, so unknown
/// attributes survive a round-trip through the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserAttributes(BTreeMap<String, String>);

impl UserAttributes {
    /// Build from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Raw attribute lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Set an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// User id (`sub`), empty when absent.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.get(attr::SUB).map(UserId::from).unwrap_or_default()
    }

    /// Email, empty when absent.
    #[must_use]
    pub fn email(&self) -> &str {
        self.get(attr::EMAIL).unwrap_or_default()
    }

    /// The cached role string exactly as stored.
    #[must_use]
    pub fn raw_role(&self) -> Option<&str> {
        self.get(attr::ROLE)
    }

    /// Role with the buyer fallback applied.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_attribute(self.raw_role())
    }

    /// Whether no attribute is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Entry of the admin user directory (read-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Provider username.
    pub id: String,
    /// Email address, empty when unknown.
    #[serde(default)]
    pub email: String,
    /// Role attribute as stored by the provider, empty when unset.
    #[serde(default)]
    pub role: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let attrs = UserAttributes::default();
        assert!(attrs.user_id().is_empty());
        assert_eq!(attrs.email(), "");
        assert_eq!(attrs.role(), Role::Buyer);
    }

    #[test]
    fn test_accessors() {
        let attrs = UserAttributes::from_pairs([
            ("sub", "u-1"),
            ("email", "seller@example.com"),
            ("custom:role", "seller"),
            ("email_verified", "true"),
        ]);
        assert_eq!(attrs.user_id(), UserId::from("u-1"));
        assert_eq!(attrs.email(), "seller@example.com");
        assert_eq!(attrs.role(), Role::Seller);
        assert_eq!(attrs.get("email_verified"), Some("true"));
    }

    #[test]
    fn test_json_is_flat_map() {
        let attrs = UserAttributes::from_pairs([("sub", "u-1"), ("custom:role", "buyer")]);
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"custom:role":"buyer","sub":"u-1"}"#);
    }
}
