//! Listing records and partial updates.

use serde::{Deserialize, Serialize};

use super::{ListingId, ListingStatus, Price, UserId};

/// A seller's item for sale ("product" in API paths).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing identifier.
    pub id: ListingId,
    /// Display title.
    pub title: String,
    /// Asking price.
    pub price: Price,
    /// Category (free text).
    pub category: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Object-storage key of the listing image.
    pub image_key: Option<String>,
    /// Seller who owns the listing.
    pub seller_id: UserId,
    /// Lifecycle status.
    pub status: ListingStatus,
}

impl Listing {
    /// Whether `user` owns this listing.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        !user.is_empty() && &self.seller_id == user
    }

    /// Full image URL under a CDN prefix, if the listing has an image.
    #[must_use]
    pub fn image_url(&self, cdn_base: &str) -> Option<String> {
        self.image_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| format!("{cdn_base}{key}?auto=compress&width=600"))
    }
}

/// Partial update of a listing.
///
/// Only fields that are `Some` are sent; the API leaves the rest untouched.
/// Serialized as the JSON object carried in `updates_json_string`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// New image key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

impl ListingUpdate {
    /// Whether the update carries no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_key.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            id: ListingId::new(1),
            title: "Brass lamp".to_string(),
            price: Price::parse("25").unwrap(),
            category: Some("lighting".to_string()),
            description: None,
            image_key: Some("products/abc.jpg".to_string()),
            seller_id: UserId::from("seller-1"),
            status: ListingStatus::Active,
        }
    }

    #[test]
    fn test_is_owned_by() {
        let listing = listing();
        assert!(listing.is_owned_by(&UserId::from("seller-1")));
        assert!(!listing.is_owned_by(&UserId::from("seller-2")));
        assert!(!listing.is_owned_by(&UserId::default()));
    }

    #[test]
    fn test_image_url_uses_cdn_prefix() {
        assert_eq!(
            listing().image_url("https://cdn.example.com/").as_deref(),
            Some("https://cdn.example.com/products/abc.jpg?auto=compress&width=600")
        );
        let mut without = listing();
        without.image_key = Some(String::new());
        assert_eq!(without.image_url("https://cdn.example.com/"), None);
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = ListingUpdate {
            price: Some(Price::parse("12.5").unwrap()),
            ..ListingUpdate::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"price":12.5}"#);
        assert!(!update.is_empty());
        assert!(ListingUpdate::default().is_empty());
    }
}
