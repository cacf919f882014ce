//! Order history records.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{ListingId, Price, TransactionId, UserId};

/// A completed (or pending) purchase as reported by the order ledger.
///
/// The client never mutates orders; it only reads a party's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Ledger transaction identifier.
    pub transaction_id: TransactionId,
    /// Purchased listing, when the ledger reports it.
    #[serde(default, alias = "product_id")]
    pub listing_id: Option<ListingId>,
    /// Buyer party.
    #[serde(default)]
    pub buyer_id: Option<UserId>,
    /// Seller party.
    #[serde(default)]
    pub seller_id: Option<UserId>,
    /// Title of the purchased listing.
    #[serde(default)]
    pub name: Option<String>,
    /// Category of the purchased listing.
    #[serde(default)]
    pub category: Option<String>,
    /// Price paid.
    #[serde(default)]
    pub price: Option<Price>,
    /// When the order was recorded (UTC).
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Ledger status, e.g. `completed`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Accept RFC 3339 timestamps and the API's offset-less `TIMESTAMP` values.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
