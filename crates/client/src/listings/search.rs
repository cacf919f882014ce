//! Search form validation and the search query strategy.

use std::fmt;
use std::str::FromStr;

use ramm_core::{Listing, ListingId, Price};
use rust_decimal::Decimal;

use super::ListingQuery;
use crate::api::{ApiClient, SearchParams};
use crate::error::ClientError;
use crate::session::Session;

pub const INVALID_ID_MESSAGE: &str = "Please enter a valid Product ID (a number greater than 0).";
pub const INVALID_PRICE_MESSAGE: &str = "Please enter valid numbers for price.";
pub const PRICE_ORDER_MESSAGE: &str = "Minimum price cannot be greater than maximum price.";

/// What the search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    ProductId,
    #[default]
    Name,
    Category,
    SellerId,
    PriceRange,
}

impl SearchMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::Name => "name",
            Self::Category => "category",
            Self::SellerId => "seller_id",
            Self::PriceRange => "price_range",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "product_id" => Ok(Self::ProductId),
            "name" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            "seller_id" => Ok(Self::SellerId),
            "price_range" => Ok(Self::PriceRange),
            other => Err(ClientError::validation(format!(
                "Invalid search criteria selected: {other}"
            ))),
        }
    }
}

/// Search input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub mode: SearchMode,
    /// Term for every mode except `price_range`.
    pub term: String,
    pub min_price: String,
    pub max_price: String,
}

impl SearchForm {
    /// Validate and build the query. Nothing is sent when this fails.
    ///
    /// An empty term for name, category or seller matches everything. A
    /// negative maximum is dropped from the request; a negative minimum is
    /// sent as entered.
    ///
    /// # Errors
    ///
    /// Returns a validation error with the message to show.
    pub fn validate(&self) -> Result<SearchQuery, ClientError> {
        let term = self.term.trim();
        let text = || (!term.is_empty()).then(|| term.to_string());

        let params = match self.mode {
            SearchMode::ProductId => SearchParams {
                product_id: Some(
                    ListingId::parse_positive(term)
                        .map_err(|_| ClientError::validation(INVALID_ID_MESSAGE))?,
                ),
                ..SearchParams::default()
            },
            SearchMode::Name => SearchParams {
                name: text(),
                ..SearchParams::default()
            },
            SearchMode::Category => SearchParams {
                category: text(),
                ..SearchParams::default()
            },
            SearchMode::SellerId => SearchParams {
                seller_id: text(),
                ..SearchParams::default()
            },
            SearchMode::PriceRange => {
                let min = parse_bound(&self.min_price)?;
                let max = parse_bound(&self.max_price)?;
                if matches!((min, max), (Some(min), Some(max)) if min > max) {
                    return Err(ClientError::validation(PRICE_ORDER_MESSAGE));
                }
                // A negative maximum is not sent; the minimum always is
                SearchParams {
                    min_price: min,
                    max_price: max.and_then(|v| Price::new(v).ok()),
                    ..SearchParams::default()
                }
            }
        };

        Ok(SearchQuery {
            params,
            empty_message: self.no_results_message(),
        })
    }

    /// Message for an empty result, specific to the mode and term used.
    #[must_use]
    pub fn no_results_message(&self) -> String {
        let term = self.term.trim();
        let min = self.min_price.trim();
        let max = self.max_price.trim();

        match self.mode {
            SearchMode::PriceRange => match (min.is_empty(), max.is_empty()) {
                (false, false) => format!("No products found with price between {min} and {max}."),
                (false, true) => {
                    format!("No products found with price greater than or equal to {min}.")
                }
                (true, false) => format!("No products found with price less than or equal to {max}."),
                (true, true) => "No products available at this time.".to_string(),
            },
            _ if term.is_empty() => "No products available matching the criteria.".to_string(),
            SearchMode::ProductId => format!("No product found with ID \"{term}\"."),
            SearchMode::Name => format!("No products found with name like \"{term}\"."),
            SearchMode::Category => format!("No products found in category like \"{term}\"."),
            SearchMode::SellerId => format!("No products found for seller ID \"{term}\"."),
        }
    }
}

fn parse_bound(raw: &str) -> Result<Option<Decimal>, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .map_err(|_| ClientError::validation(INVALID_PRICE_MESSAGE))
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    params: SearchParams,
    empty_message: String,
}

impl SearchQuery {
    /// Parameters sent to the search endpoint.
    #[must_use]
    pub const fn params(&self) -> &SearchParams {
        &self.params
    }
}

impl ListingQuery for SearchQuery {
    async fn fetch(&self, api: &ApiClient, _session: &Session) -> Result<Vec<Listing>, ClientError> {
        api.search(&self.params).await
    }

    fn empty_message(&self) -> String {
        self.empty_message.clone()
    }
}
