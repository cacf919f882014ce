//! Administration view: user directory and listing moderation.
//!
//! The role gate here is a convenience for the UI. The API authorizes
//! every admin call against the bearer token.

use ramm_core::{Listing, ListingId, ListingStatus, UserSummary};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::Session;

pub const NO_ACCESS_MESSAGE: &str = "No Access";
pub const USERS_FAILED: &str = "Failed to fetch users";
pub const LISTINGS_FAILED: &str = "Failed to fetch products";
pub const TOGGLE_FAILED: &str = "Failed to delete product";

/// The session's cached role is not admin.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("No Access: administrator role required (current role: {role})")]
pub struct AccessDenied {
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminSection {
    #[default]
    Users,
    Listings,
}

/// Moderation action offered for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    /// Hide an active listing.
    Remove,
    /// Restore a removed listing.
    Keep,
}

impl ModerationAction {
    /// Action for a listing; `None` for sold listings.
    #[must_use]
    pub const fn for_status(status: ListingStatus) -> Option<Self> {
        match status {
            ListingStatus::Active => Some(Self::Remove),
            ListingStatus::Removed => Some(Self::Keep),
            ListingStatus::Sold => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Remove => "Remove",
            Self::Keep => "Keep",
        }
    }
}

pub struct AdminView<'a> {
    api: &'a ApiClient,
    token: SecretString,
    section: AdminSection,
    users: Option<Vec<UserSummary>>,
    listings: Option<Vec<Listing>>,
}

impl std::fmt::Debug for AdminView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminView")
            .field("section", &self.section)
            .field("users", &self.users.as_ref().map(Vec::len))
            .field("listings", &self.listings.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl<'a> AdminView<'a> {
    /// Open the view. Nothing is fetched here, allowed or not.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] unless the cached role is admin in any case.
    pub fn open(api: &'a ApiClient, session: &Session) -> Result<Self, AccessDenied> {
        if !session.is_admin() {
            let role = session.raw_role().unwrap_or("buyer").to_string();
            warn!(%role, "Administration view denied");
            return Err(AccessDenied { role });
        }
        Ok(Self {
            api,
            token: session.token().cloned().unwrap_or_else(|| SecretString::from("")),
            section: AdminSection::default(),
            users: None,
            listings: None,
        })
    }

    #[must_use]
    pub const fn section(&self) -> AdminSection {
        self.section
    }

    /// Switch sections. The section is fetched the first time it is shown.
    ///
    /// # Errors
    ///
    /// Returns the fetch error of the newly selected section.
    pub async fn select(&mut self, section: AdminSection) -> Result<(), ClientError> {
        self.section = section;
        match section {
            AdminSection::Users => self.users().await.map(|_| ()),
            AdminSection::Listings => self.listings().await.map(|_| ()),
        }
    }

    /// User directory, fetched once.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the next call retries.
    pub async fn users(&mut self) -> Result<&[UserSummary], ClientError> {
        if self.users.is_none() {
            let users = self.api.list_users(&self.token).await?;
            debug!(count = users.len(), "User directory loaded");
            self.users = Some(users);
        }
        Ok(self.users.as_deref().unwrap_or_default())
    }

    /// All listings, fetched once.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the next call retries.
    pub async fn listings(&mut self) -> Result<&[Listing], ClientError> {
        if self.listings.is_none() {
            self.refresh_listings().await?;
        }
        Ok(self.listings.as_deref().unwrap_or_default())
    }

    /// Toggle a listing between removed and kept, then re-fetch listings.
    ///
    /// # Errors
    ///
    /// Returns a validation error for sold or unknown listings, or the API
    /// error. The cached listings survive a failed toggle.
    #[instrument(skip(self))]
    pub async fn toggle_listing(&mut self, id: ListingId) -> Result<ModerationAction, ClientError> {
        let status = match self.listings().await?.iter().find(|listing| listing.id == id) {
            Some(listing) => listing.status,
            None => {
                return Err(ClientError::validation(format!(
                    "Product {id} is not in the listings."
                )));
            }
        };
        let action = ModerationAction::for_status(status)
            .ok_or_else(|| ClientError::validation("Sold products cannot be moderated."))?;

        self.api.toggle_listing(id, &self.token).await?;
        info!(listing_id = %id, action = action.label(), "Listing moderated");
        self.refresh_listings().await?;
        Ok(action)
    }

    async fn refresh_listings(&mut self) -> Result<(), ClientError> {
        let listings = self.api.list_all_listings(&self.token).await?;
        debug!(count = listings.len(), "Listings loaded");
        self.listings = Some(listings);
        Ok(())
    }
}

/// Message for a failed fetch or toggle in `section`.
#[must_use]
pub fn error_message(section: AdminSection, error: &ClientError) -> String {
    match section {
        AdminSection::Users => error.user_message(USERS_FAILED),
        AdminSection::Listings => error.user_message(LISTINGS_FAILED),
    }
}

/// Message for a failed moderation toggle.
#[must_use]
pub fn toggle_error_message(error: &ClientError) -> String {
    error.user_message(TOGGLE_FAILED)
}
