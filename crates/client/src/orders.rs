//! Orders view: order history plus the checkout hand-off for a pending
//! purchase.

use ramm_core::{Order, Role};
use tracing::{info, instrument, warn};
use url::Url;

use crate::api::{ApiClient, PurchaseParams};
use crate::error::ClientError;
use crate::routes::{PendingPurchase, Route};
use crate::session::Session;

pub const FETCH_FAILED: &str = "Failed to fetch orders";
pub const CHECKOUT_FAILED: &str = "Failed to initiate payment";
pub const INVALID_CHECKOUT_MESSAGE: &str =
    "Failed to initiate payment: Invalid response from server.";
pub const EMPTY_MESSAGE: &str = "No orders yet.";

/// Where the payment processor expects the user next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub url: Url,
}

pub struct OrdersView<'a> {
    api: &'a ApiClient,
    session: &'a Session,
    pending: Option<PendingPurchase>,
    orders: Vec<Order>,
}

impl<'a> OrdersView<'a> {
    #[must_use]
    pub const fn new(
        api: &'a ApiClient,
        session: &'a Session,
        pending: Option<PendingPurchase>,
    ) -> Self {
        Self {
            api,
            session,
            pending,
            orders: Vec::new(),
        }
    }

    /// View for `/orders`, or `None` for any other route.
    #[must_use]
    pub fn from_route(api: &'a ApiClient, session: &'a Session, route: &Route) -> Option<Self> {
        match route {
            Route::Orders(pending) => Some(Self::new(api, session, pending.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingPurchase> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Fetch the signed-in party's order history.
    ///
    /// Sellers are queried by their own id on both sides.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the history is left empty.
    #[instrument(skip(self))]
    pub async fn load_orders(&mut self) -> Result<&[Order], ClientError> {
        let user_id = self.session.user_id();
        let role = self.session.role();
        let seller_id = (role == Role::Seller).then_some(&user_id);

        match self.api.list_orders(&user_id, seller_id, role).await {
            Ok(orders) => {
                self.orders = orders;
                Ok(&self.orders)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch orders");
                self.orders.clear();
                Err(e)
            }
        }
    }

    /// Request a checkout session for the pending purchase.
    ///
    /// The view stays put on failure; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns a validation error without a pending purchase, an
    /// invalid-response error when the session carries no usable URL, or the
    /// request error.
    #[instrument(skip(self))]
    pub async fn start_checkout(&self) -> Result<CheckoutRedirect, ClientError> {
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| ClientError::validation("No purchase is pending."))?;
        let purchase = PurchaseParams {
            buyer_id: self.session.user_id(),
            seller_id: pending.seller_id.clone(),
            listing_id: pending.listing_id,
        };

        let checkout = self.api.create_checkout_session(&purchase).await?;
        let url = checkout
            .checkout_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("missing checkout_url".to_string()))?;
        let url = Url::parse(url.trim())
            .map_err(|e| ClientError::InvalidResponse(format!("checkout_url: {e}")))?;

        info!(listing_id = %purchase.listing_id, "Checkout session created");
        Ok(CheckoutRedirect { url })
    }
}

/// Message for a failed history fetch.
#[must_use]
pub fn fetch_error_message(error: &ClientError) -> String {
    error.user_message(FETCH_FAILED)
}

/// Message for a failed checkout.
#[must_use]
pub fn checkout_error_message(error: &ClientError) -> String {
    match error {
        ClientError::InvalidResponse(_) => INVALID_CHECKOUT_MESSAGE.to_string(),
        other => other.user_message(CHECKOUT_FAILED),
    }
}
