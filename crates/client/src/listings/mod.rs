//! Listing collection shared by the browse and search views.
//!
//! The collection owns loading, the role-visibility rule and the
//! update/delete/buy actions. A [`ListingQuery`] strategy decides which
//! endpoint is called and with which parameters.

pub mod edit;
pub mod search;

use std::future::Future;

use ramm_core::{Listing, ListingId, ListingStatus, Role};
use tracing::{debug, instrument, warn};

pub use edit::EditForm;
pub use search::{SearchForm, SearchMode, SearchQuery};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::routes::{PendingPurchase, Route};
use crate::session::Session;

/// Prompt shown before a listing is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this product?";

/// Where a collection gets its listings from.
pub trait ListingQuery: Send + Sync {
    /// Fetch the raw result set.
    fn fetch(
        &self,
        api: &ApiClient,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<Listing>, ClientError>> + Send;

    /// Message shown when the visible result set is empty.
    fn empty_message(&self) -> String;
}

/// Listings view: every listing, or the seller's own when signed in as seller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseQuery;

impl ListingQuery for BrowseQuery {
    async fn fetch(&self, api: &ApiClient, session: &Session) -> Result<Vec<Listing>, ClientError> {
        let seller_id = session.user_id();
        let scope = (session.role() == Role::Seller).then_some(&seller_id);
        api.list_products(scope).await
    }

    fn empty_message(&self) -> String {
        "No products available at this time.".to_string()
    }
}

/// Interactive yes/no confirmation.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Actions offered for one listing. Offering is not authorization; the
/// API enforces ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingActions {
    pub update: bool,
    pub delete: bool,
    pub buy: bool,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// A rendered list of listings plus the actions on it.
pub struct ListingCollection<'a, Q> {
    api: &'a ApiClient,
    session: &'a Session,
    query: Q,
    items: Vec<Listing>,
}

impl<'a, Q: ListingQuery> ListingCollection<'a, Q> {
    pub const fn new(api: &'a ApiClient, session: &'a Session, query: Q) -> Self {
        Self {
            api,
            session,
            query,
            items: Vec::new(),
        }
    }

    /// Listings currently shown.
    #[must_use]
    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    #[must_use]
    pub const fn query(&self) -> &Q {
        &self.query
    }

    /// Message for an empty collection.
    #[must_use]
    pub fn empty_message(&self) -> String {
        self.query.empty_message()
    }

    /// Page title for the current role.
    #[must_use]
    pub fn title(&self) -> &'static str {
        if self.session.role() == Role::Seller {
            "My Products"
        } else {
            "Available Products"
        }
    }

    /// Fetch and apply the visibility rule: only sellers see sold listings.
    ///
    /// On failure the collection is emptied; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<&[Listing], ClientError> {
        match self.query.fetch(self.api, self.session).await {
            Ok(listings) => {
                self.items = visible_to(self.session.role(), listings);
                debug!(count = self.items.len(), "Listings loaded");
                Ok(&self.items)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load listings");
                self.items.clear();
                Err(e)
            }
        }
    }

    /// Actions offered on `listing` for the session's role.
    #[must_use]
    pub fn actions_for(&self, listing: &Listing) -> ListingActions {
        let seller = self.session.role() == Role::Seller;
        let owner = seller && listing.is_owned_by(&self.session.user_id());
        ListingActions {
            update: owner,
            delete: owner,
            buy: !seller && listing.status != ListingStatus::Sold,
        }
    }

    /// Seller entry point to the creation flow.
    #[must_use]
    pub fn create_route(&self) -> Option<Route> {
        (self.session.role() == Role::Seller).then_some(Route::AddProduct)
    }

    /// Send the changed fields of `form` and replace the item with the
    /// server's representation.
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing sent) or the API error.
    #[instrument(skip(self, form))]
    pub async fn update(&mut self, id: ListingId, form: &EditForm) -> Result<&Listing, ClientError> {
        let current = self.find(id)?;
        if !self.actions_for(current).update {
            return Err(ClientError::validation("Only sellers can update products."));
        }

        let patch = form.to_update(current)?;
        let updated = self
            .api
            .update_product(id, &self.session.user_id(), &patch)
            .await?;
        let slot = self
            .items
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or_else(|| not_listed(id))?;
        *slot = updated;
        Ok(slot)
    }

    /// Delete after interactive confirmation; removes the item locally on
    /// success without refetching.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the API error.
    #[instrument(skip(self, confirm))]
    pub async fn delete(&mut self, id: ListingId, confirm: &impl Confirm) -> Result<DeleteOutcome, ClientError> {
        if !self.actions_for(self.find(id)?).delete {
            return Err(ClientError::validation("Only sellers can delete products."));
        }
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.api.delete_product(id, &self.session.user_id()).await?;
        self.items.retain(|listing| listing.id != id);
        Ok(DeleteOutcome::Deleted)
    }

    /// Route to the orders view carrying the purchase.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the listing cannot be bought.
    pub fn buy(&self, id: ListingId) -> Result<Route, ClientError> {
        let listing = self.find(id)?;
        if !self.actions_for(listing).buy {
            return Err(ClientError::validation("This product cannot be purchased."));
        }
        Ok(Route::Orders(Some(PendingPurchase {
            listing_id: listing.id,
            seller_id: listing.seller_id.clone(),
        })))
    }

    fn find(&self, id: ListingId) -> Result<&Listing, ClientError> {
        self.items
            .iter()
            .find(|listing| listing.id == id)
            .ok_or_else(|| not_listed(id))
    }
}

fn not_listed(id: ListingId) -> ClientError {
    ClientError::validation(format!("Product {id} is not in the current list."))
}

/// Non-sellers never see sold listings.
fn visible_to(role: Role, listings: Vec<Listing>) -> Vec<Listing> {
    if role == Role::Seller {
        return listings;
    }
    listings
        .into_iter()
        .filter(|listing| listing.status.is_visible_to_buyers())
        .collect()
}
