//! Wire records of the marketplace API.
//!
//! The API names things differently from the domain (`ProductID`, `title`,
//! `imageKey`, category stored under `description`). Everything is converted
//! into `ramm-core` types before leaving this module.

use ramm_core::{Listing, ListingId, ListingStatus, Price, TransactionId, UserId};
use serde::Deserialize;

/// A product as returned by the products, search and update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "ProductID", alias = "product_id")]
    pub product_id: ListingId,
    #[serde(default, alias = "name")]
    pub title: String,
    pub price: Price,
    /// Missing on single-product reads; `null` on legacy rows.
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub category: Option<String>,
    /// Holds the category on current API versions.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "imageKey", alias = "image_key")]
    pub image_key: Option<String>,
    #[serde(default)]
    pub seller_id: UserId,
}

impl From<ProductRecord> for Listing {
    fn from(record: ProductRecord) -> Self {
        let category = record.category.or_else(|| record.description.clone());
        Self {
            id: record.product_id,
            title: record.title,
            price: record.price,
            category,
            description: record.description,
            image_key: record.image_key,
            seller_id: record.seller_id,
            status: record.status.unwrap_or_default(),
        }
    }
}

/// Pre-signed upload target.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    pub upload_url: String,
    pub key: String,
}

/// Response of `create-product`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CreatedProduct {
    pub product_id: ListingId,
}

/// Response of a listing update.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub updated: bool,
    pub product: ProductRecord,
}

/// Response of `create-checkout-session`. The URL is validated by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// Response of `finalize-order`.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_record_maps_wire_names() {
        let json = r#"{
            "ProductID": 7,
            "title": "Brass lamp",
            "price": 25.5,
            "status": "unsold",
            "quantity": 1,
            "description": "lighting",
            "imageKey": "products/abc.jpg",
            "seller_id": "seller-1"
        }"#;
        let listing: Listing = serde_json::from_str::<ProductRecord>(json).unwrap().into();
        assert_eq!(listing.id, ListingId::new(7));
        assert_eq!(listing.title, "Brass lamp");
        assert_eq!(listing.price, Price::parse("25.5").unwrap());
        assert_eq!(listing.category.as_deref(), Some("lighting"));
        assert_eq!(listing.image_key.as_deref(), Some("products/abc.jpg"));
        assert_eq!(listing.status, ListingStatus::Active);
    }

    #[test]
    fn test_product_record_tolerates_missing_and_null_fields() {
        let json = r#"{"ProductID": 3, "title": "Chair", "price": 10, "status": null,
                       "description": null, "imageKey": null, "seller_id": "s"}"#;
        let listing: Listing = serde_json::from_str::<ProductRecord>(json).unwrap().into();
        assert_eq!(listing.status, ListingStatus::Active);
        assert!(listing.category.is_none());
        assert!(listing.image_key.is_none());
    }

    #[test]
    fn test_sold_status() {
        let json = r#"{"ProductID": 3, "title": "Chair", "price": 10, "status": "sold", "seller_id": "s"}"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, Some(ListingStatus::Sold));
    }

    #[test]
    fn test_checkout_session_without_url() {
        let session: CheckoutSession = serde_json::from_str("{}").unwrap();
        assert!(session.checkout_url.is_none());
    }
}
