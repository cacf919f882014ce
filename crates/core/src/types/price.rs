//! Type-safe price representation using decimal arithmetic.
//!
//! Listing prices travel as JSON numbers (the API stores floats), but the
//! client parses and compares them as [`Decimal`] so that `"10.10"` and
//! `10.1` are the same price.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a number.
    #[error("price must be a number, got {0:?}")]
    NotANumber(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative listing price in the store currency.
///
/// Values coming back from the API are taken as-is; [`Price::parse`] is the
/// gate for anything a user typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse user input as a price.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, not a decimal number,
    /// or negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramm_core::{Price, PriceError};
    ///
    /// assert!(Price::parse("19.99").is_ok());
    /// assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    /// assert!(matches!(Price::parse("abc"), Err(PriceError::NotANumber(_))));
    /// ```
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount: Decimal = trimmed
            .parse()
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))?;
        Self::new(amount)
    }

    /// Wrap a decimal amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("10").unwrap().amount(), Decimal::new(10, 0));
        assert_eq!(Price::parse(" 19.99 ").unwrap().amount(), Decimal::new(1999, 2));
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
        assert_eq!(Price::parse("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(Price::parse("ten"), Err(PriceError::NotANumber(_))));
        assert!(matches!(Price::parse("1,5"), Err(PriceError::NotANumber(_))));
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
    }

    #[test]
    fn test_equal_prices_compare_equal_after_normalize() {
        assert_eq!(Price::parse("10.10").unwrap(), Price::parse("10.1").unwrap());
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::parse("12.5").unwrap()).unwrap();
        assert_eq!(json, "12.5");
        let parsed: Price = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Price::parse("3").unwrap());
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::parse("4.5").unwrap().to_string(), "$4.50");
    }
}
