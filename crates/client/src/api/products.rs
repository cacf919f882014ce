//! Product (listing) endpoints and the image upload.

use std::sync::Arc;

use ramm_core::{Listing, ListingId, ListingUpdate, Price, UserId};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use rust_decimal::Decimal;
use reqwest::multipart;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use super::ApiClient;
use super::types::{CreatedProduct, ProductRecord, UpdateResponse, UploadTarget};
use crate::error::ClientError;

/// Upload body chunk size.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Upload progress observer, called with a percentage (0-100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Query parameters of `GET /api/search/`. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ListingId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,
    /// Sent as entered, negative values included.
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
}

impl ApiClient {
    /// Request a pre-signed upload target for `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn upload_url(&self, filename: &str) -> Result<UploadTarget, ClientError> {
        let url = self.url("api/products/upload-url")?;
        let target: UploadTarget = self
            .send_json(self.http().get(url).query(&[("filename", filename)]))
            .await?;
        debug!(key = %target.key, "Upload target issued");
        Ok(target)
    }

    /// Upload raw image bytes to a pre-signed URL.
    ///
    /// The body is streamed in chunks so `progress` sees the percentage
    /// handed to the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or storage rejects the upload.
    #[instrument(skip(self, bytes, progress), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), ClientError> {
        let url = Url::parse(upload_url)
            .map_err(|e| ClientError::InvalidResponse(format!("Invalid upload URL: {e}")))?;

        let total = bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let observer = progress.clone();
        let mut sent = 0_u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(observer) = &observer {
                observer(percent(sent, total));
            }
            Ok::<_, std::io::Error>(chunk)
        }));

        let request = self
            .http()
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream));
        self.send(request).await?;

        if let Some(progress) = &progress {
            progress(100);
        }
        debug!("Image uploaded");
        Ok(())
    }

    /// Create a listing referencing an uploaded image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, name, category))]
    pub async fn create_product(
        &self,
        name: &str,
        price: Price,
        category: &str,
        seller_id: &UserId,
        image_key: &str,
    ) -> Result<ListingId, ClientError> {
        let url = self.url("api/products/create-product")?;
        let form = [
            ("name", name.to_string()),
            ("price", price.amount().to_string()),
            ("category", category.to_string()),
            ("seller_id", seller_id.to_string()),
            ("image_keys", image_key.to_string()),
        ];
        let created: CreatedProduct = self.send_json(self.http().post(url).form(&form)).await?;
        debug!(listing_id = %created.product_id, "Listing created");
        Ok(created.product_id)
    }

    /// List listings, optionally scoped to one seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, seller_id: Option<&UserId>) -> Result<Vec<Listing>, ClientError> {
        let url = self.url("api/products/")?;
        let mut request = self.http().get(url);
        if let Some(seller_id) = seller_id {
            request = request.query(&[("seller_id", seller_id.as_str())]);
        }
        let records: Vec<ProductRecord> = self.send_json(request).await?;
        debug!(count = records.len(), "Listings fetched");
        Ok(records.into_iter().map(Listing::from).collect())
    }

    /// Fetch one listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (404 when unknown).
    #[instrument(skip(self))]
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, ClientError> {
        let url = self.url(&format!("api/products/{id}"))?;
        let record: ProductRecord = self.send_json(self.http().get(url)).await?;
        Ok(record.into())
    }

    /// Apply a partial update; returns the server's representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ListingId,
        seller_id: &UserId,
        update: &ListingUpdate,
    ) -> Result<Listing, ClientError> {
        let url = self.url(&format!("api/products/{id}"))?;
        let updates_json = serde_json::to_string(update)
            .map_err(|e| ClientError::validation(format!("Failed to encode update: {e}")))?;
        let form = multipart::Form::new()
            .text("seller_id", seller_id.to_string())
            .text("updates_json_string", updates_json);

        let response: UpdateResponse = self.send_json(self.http().put(url).multipart(form)).await?;
        debug!(updated = response.updated, "Listing updated");
        Ok(response.product.into())
    }

    /// Delete a listing owned by `seller_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ListingId, seller_id: &UserId) -> Result<(), ClientError> {
        let url = self.url(&format!("api/products/{id}"))?;
        self.send(
            self.http()
                .delete(url)
                .form(&[("seller_id", seller_id.as_str())]),
        )
        .await?;
        debug!("Listing deleted");
        Ok(())
    }

    /// Parameterized search.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>, ClientError> {
        let url = self.url("api/search/")?;
        let records: Vec<ProductRecord> = self.send_json(self.http().get(url).query(params)).await?;
        debug!(count = records.len(), "Search results fetched");
        Ok(records.into_iter().map(Listing::from).collect())
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(50, 200), 25);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_search_params_skip_absent_fields() {
        let params = SearchParams {
            product_id: Some(ListingId::new(42)),
            ..SearchParams::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({ "product_id": 42 })
        );
    }

    #[test]
    fn test_search_params_send_negative_min_as_number() {
        let params = SearchParams {
            min_price: Some(Decimal::new(-3, 0)),
            max_price: Some(Price::parse("10").unwrap()),
            ..SearchParams::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({ "min_price": -3.0, "max_price": 10.0 })
        );
    }
}
