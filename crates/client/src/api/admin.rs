//! Administration endpoints. All calls carry the session's bearer token.

use ramm_core::{Listing, ListingId, UserSummary};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::ApiClient;
use super::types::ProductRecord;
use crate::error::ClientError;

impl ApiClient {
    /// User directory (read-only).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_users(&self, token: &SecretString) -> Result<Vec<UserSummary>, ClientError> {
        let url = self.url("api/admin/users")?;
        let users: Vec<UserSummary> = self
            .send_json(self.http().get(url).bearer_auth(token.expose_secret()))
            .await?;
        debug!(count = users.len(), "Users fetched");
        Ok(users)
    }

    /// Every listing regardless of seller or status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_all_listings(&self, token: &SecretString) -> Result<Vec<Listing>, ClientError> {
        let url = self.url("api/products")?;
        let records: Vec<ProductRecord> = self
            .send_json(self.http().get(url).bearer_auth(token.expose_secret()))
            .await?;
        Ok(records.into_iter().map(Listing::from).collect())
    }

    /// Moderation toggle of one listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn toggle_listing(&self, id: ListingId, token: &SecretString) -> Result<(), ClientError> {
        let url = self.url(&format!("api/admin/{id}"))?;
        self.send(self.http().delete(url).bearer_auth(token.expose_secret()))
            .await?;
        debug!("Listing moderation toggled");
        Ok(())
    }
}
