//! Update form for a listing.

use ramm_core::{Listing, ListingUpdate, Price};

use crate::error::ClientError;

pub const INVALID_PRICE_MESSAGE: &str = "Please enter a valid positive number for price.";
pub const NO_CHANGES_MESSAGE: &str = "No changes detected or invalid input.";

/// Edit form values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image_key: String,
}

impl EditForm {
    /// Form prefilled from the current listing.
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            name: listing.title.clone(),
            category: listing.category.clone().unwrap_or_default(),
            price: listing.price.amount().to_string(),
            description: listing.description.clone().unwrap_or_default(),
            image_key: listing.image_key.clone().unwrap_or_default(),
        }
    }

    /// Build the update patch against `current`.
    ///
    /// A field is sent only when it is non-empty and differs from the
    /// listing's current value. The price is validated before anything is
    /// sent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-numeric or negative price, or
    /// when nothing changed.
    pub fn to_update(&self, current: &Listing) -> Result<ListingUpdate, ClientError> {
        let price = match non_empty(&self.price) {
            Some(raw) => {
                let price =
                    Price::parse(raw).map_err(|_| ClientError::validation(INVALID_PRICE_MESSAGE))?;
                (price != current.price).then_some(price)
            }
            None => None,
        };

        let update = ListingUpdate {
            name: changed(&self.name, Some(current.title.as_str())),
            category: changed(&self.category, current.category.as_deref()),
            description: changed(&self.description, current.description.as_deref()),
            price,
            image_key: changed(&self.image_key, current.image_key.as_deref()),
        };

        if update.is_empty() {
            return Err(ClientError::validation(NO_CHANGES_MESSAGE));
        }
        Ok(update)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn changed(value: &str, current: Option<&str>) -> Option<String> {
    non_empty(value)
        .filter(|v| Some(*v) != current)
        .map(str::to_string)
}
