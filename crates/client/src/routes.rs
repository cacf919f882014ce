//! Path to view mapping.
//!
//! | Path | View |
//! |---|---|
//! | `/` | redirects to `/login` |
//! | `/login`, `/signup`, `/confirmation` | authentication flow |
//! | `/products` | listing collection (browse) |
//! | `/add-product` | creation flow |
//! | `/search` | listing collection (search) |
//! | `/orders` | orders view; `?product_id=&seller_id=` starts a checkout |
//! | `/ordersuccess` | finalization; `?buyer_id=&seller_id=&product_id=` |
//! | `/admin` | administration view |

use std::fmt;

use ramm_core::{ListingId, UserId};
use thiserror::Error;
use url::Url;

/// Base used to parse bare paths.
const PATH_BASE: &str = "http://localhost/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route {0:?}: {1}")]
    Invalid(String, String),
    #[error("Unknown route: {0}")]
    Unknown(String),
}

/// Listing and seller a buyer is about to pay for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPurchase {
    pub listing_id: ListingId,
    pub seller_id: UserId,
}

/// Parameters the payment processor returns with. Any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeParams {
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
    pub product_id: Option<String>,
}

/// A navigable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Signup,
    Confirmation,
    Products,
    AddProduct,
    Search,
    Orders(Option<PendingPurchase>),
    OrderSuccess(FinalizeParams),
    Admin,
}

impl Route {
    /// Parse a path (`/orders?product_id=3&seller_id=s`) or a full URL.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input or an unknown path.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let trimmed = input.trim();
        let invalid = |e: url::ParseError| RouteError::Invalid(trimmed.to_string(), e.to_string());
        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(PATH_BASE)
                .and_then(|base| base.join(trimmed))
                .map_err(invalid)?,
            Err(e) => return Err(invalid(e)),
        };

        let query = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let path = url.path().trim_end_matches('/');
        let route = match path {
            "" => Self::Root,
            "/login" => Self::Login,
            "/signup" => Self::Signup,
            "/confirmation" => Self::Confirmation,
            "/products" => Self::Products,
            "/add-product" => Self::AddProduct,
            "/search" => Self::Search,
            "/orders" => {
                let listing_id = query("product_id").and_then(|id| ListingId::parse_positive(&id).ok());
                let seller_id = query("seller_id").map(UserId::from);
                Self::Orders(match (listing_id, seller_id) {
                    (Some(listing_id), Some(seller_id)) => Some(PendingPurchase {
                        listing_id,
                        seller_id,
                    }),
                    _ => None,
                })
            }
            "/ordersuccess" => Self::OrderSuccess(FinalizeParams {
                buyer_id: query("buyer_id"),
                seller_id: query("seller_id"),
                product_id: query("product_id"),
            }),
            "/admin" => Self::Admin,
            other => return Err(RouteError::Unknown(other.to_string())),
        };
        Ok(route)
    }

    /// Apply the initial redirect: `/` goes to `/login`.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Root => Self::Login,
            other => other,
        }
    }

    /// Render back to a path with query string.
    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Signup => "/signup".to_string(),
            Self::Confirmation => "/confirmation".to_string(),
            Self::Products => "/products".to_string(),
            Self::AddProduct => "/add-product".to_string(),
            Self::Search => "/search".to_string(),
            Self::Orders(None) => "/orders".to_string(),
            Self::Orders(Some(purchase)) => with_query(
                "/orders",
                &[
                    ("product_id", Some(purchase.listing_id.to_string())),
                    ("seller_id", Some(purchase.seller_id.to_string())),
                ],
            ),
            Self::OrderSuccess(params) => with_query(
                "/ordersuccess",
                &[
                    ("buyer_id", params.buyer_id.clone()),
                    ("seller_id", params.seller_id.clone()),
                    ("product_id", params.product_id.clone()),
                ],
            ),
            Self::Admin => "/admin".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

fn with_query(path: &str, pairs: &[(&str, Option<String>)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        if let Some(value) = value {
            serializer.append_pair(key, value);
        }
    }
    let query = serializer.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}
