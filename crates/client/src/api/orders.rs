//! Order ledger and checkout endpoints.

use ramm_core::{ListingId, Order, Role, UserId};
use tracing::{debug, instrument};

use super::ApiClient;
use super::types::{CheckoutSession, FinalizeResponse};
use crate::error::ClientError;

/// Parties of a purchase, sent as query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseParams {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub listing_id: ListingId,
}

impl PurchaseParams {
    fn query(&self) -> [(&'static str, String); 3] {
        [
            ("buyer_id", self.buyer_id.to_string()),
            ("seller_id", self.seller_id.to_string()),
            ("product_id", self.listing_id.to_string()),
        ]
    }
}

impl ApiClient {
    /// Order history of one party. Not paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        buyer_id: &UserId,
        seller_id: Option<&UserId>,
        role: Role,
    ) -> Result<Vec<Order>, ClientError> {
        let url = self.url("api/orders")?;
        let mut query = vec![
            ("buyer_id", buyer_id.as_str()),
            ("userRole", role.as_str()),
        ];
        if let Some(seller_id) = seller_id {
            query.push(("seller_id", seller_id.as_str()));
        }

        let orders: Vec<Order> = self.send_json(self.http().get(url).query(&query)).await?;
        debug!(count = orders.len(), "Orders fetched");
        Ok(orders)
    }

    /// Open a payment checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn create_checkout_session(
        &self,
        purchase: &PurchaseParams,
    ) -> Result<CheckoutSession, ClientError> {
        let url = self.url("api/orders/create-checkout-session")?;
        self.send_json(self.http().post(url).query(&purchase.query()))
            .await
    }

    /// Record a paid order and mark the listing sold.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn finalize_order(
        &self,
        purchase: &PurchaseParams,
    ) -> Result<FinalizeResponse, ClientError> {
        let url = self.url("api/orders/finalize-order")?;
        let response: FinalizeResponse = self
            .send_json(self.http().post(url).query(&purchase.query()))
            .await?;
        debug!(transaction_id = ?response.transaction_id, "Order finalized");
        Ok(response)
    }
}
