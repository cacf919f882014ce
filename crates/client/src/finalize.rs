//! Order finalization after the payment processor hands the user back.
//!
//! `Finalizing -> Finalized | Errored`. Every terminal state ends in a
//! delayed redirect to the listings view. Parameters come from the return
//! URL; when any is missing no request is made.

use std::time::Duration;

use ramm_core::{ListingId, TransactionId, UserId};
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, PurchaseParams};
use crate::routes::{FinalizeParams, Route};

pub const SUCCESS_DELAY: Duration = Duration::from_secs(3);
pub const ERROR_DELAY: Duration = Duration::from_secs(5);
pub const MISSING_PARAMS_DELAY: Duration = Duration::from_secs(3);

pub const SUCCESS_MESSAGE: &str = "Payment Successful!";
pub const FAILED_MESSAGE: &str = "Failed to finalize your order. Please contact support.";
pub const MISSING_PARAMS_MESSAGE: &str = "Missing order details for finalization.";
pub const REDIRECT_MESSAGE: &str = "Redirecting you to explore more products...";

/// Terminal state of a finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeState {
    Finalized {
        transaction_id: Option<TransactionId>,
        /// Confirmation text from the API, if any.
        message: Option<String>,
    },
    Errored(String),
}

impl FinalizeState {
    /// Message shown to the user.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Finalized { .. } => SUCCESS_MESSAGE,
            Self::Errored(message) => message,
        }
    }
}

/// Navigation that happens after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedRedirect {
    pub to: Route,
    pub delay: Duration,
}

impl DelayedRedirect {
    /// Sleep for the delay, then yield the target.
    pub async fn wait(self) -> Route {
        tokio::time::sleep(self.delay).await;
        self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub state: FinalizeState,
    pub redirect: DelayedRedirect,
}

pub struct FinalizationView<'a> {
    api: &'a ApiClient,
    purchase: Option<PurchaseParams>,
}

impl<'a> FinalizationView<'a> {
    /// View for the return route. Anything other than `/ordersuccess` with
    /// all three parameters leaves the purchase unset.
    #[must_use]
    pub fn from_route(api: &'a ApiClient, route: &Route) -> Self {
        let purchase = match route {
            Route::OrderSuccess(params) => purchase_from(params),
            _ => None,
        };
        Self { api, purchase }
    }

    /// Purchase that will be finalized, if the parameters were complete.
    #[must_use]
    pub const fn purchase(&self) -> Option<&PurchaseParams> {
        self.purchase.as_ref()
    }

    /// Finalize once. Consuming the view keeps it to a single request.
    #[instrument(skip(self))]
    pub async fn run(self) -> FinalizeOutcome {
        let Some(purchase) = self.purchase else {
            warn!("Missing order details in return URL");
            return outcome(
                FinalizeState::Errored(MISSING_PARAMS_MESSAGE.to_string()),
                MISSING_PARAMS_DELAY,
            );
        };

        match self.api.finalize_order(&purchase).await {
            Ok(response) => {
                info!(
                    listing_id = %purchase.listing_id,
                    transaction_id = ?response.transaction_id,
                    "Order finalized"
                );
                outcome(
                    FinalizeState::Finalized {
                        transaction_id: response.transaction_id,
                        message: response.message,
                    },
                    SUCCESS_DELAY,
                )
            }
            Err(e) => {
                warn!(error = %e, listing_id = %purchase.listing_id, "Failed to finalize order");
                outcome(
                    FinalizeState::Errored(FAILED_MESSAGE.to_string()),
                    ERROR_DELAY,
                )
            }
        }
    }
}

fn outcome(state: FinalizeState, delay: Duration) -> FinalizeOutcome {
    FinalizeOutcome {
        state,
        redirect: DelayedRedirect {
            to: Route::Products,
            delay,
        },
    }
}

fn purchase_from(params: &FinalizeParams) -> Option<PurchaseParams> {
    let buyer_id = params.buyer_id.as_deref()?;
    let seller_id = params.seller_id.as_deref()?;
    let listing_id = ListingId::parse_positive(params.product_id.as_deref()?).ok()?;
    Some(PurchaseParams {
        buyer_id: UserId::from(buyer_id),
        seller_id: UserId::from(seller_id),
        listing_id,
    })
}
