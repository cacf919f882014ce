//! Newtype IDs for type-safe entity references.
//!
//! Integer ids issued by the marketplace API use the `define_id!` macro.
//! User ids come from the identity provider and are opaque strings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an integer id from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input is not an integer.
    #[error("id must be a whole number, got {0:?}")]
    NotANumber(String),
    /// The input is zero or negative.
    #[error("id must be greater than 0")]
    NotPositive,
}

/// Macro to define a type-safe integer ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_i32()`, `parse_positive()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use ramm_core::define_id;
/// define_id!(ListingId);
/// define_id!(TransactionId);
///
/// let listing = ListingId::new(1);
/// let transaction = TransactionId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ListingId = transaction;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Parse user input that must be a whole number greater than 0.
            ///
            /// Surrounding whitespace is ignored.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty, not an integer, or not positive.
            pub fn parse_positive(input: &str) -> Result<Self, $crate::IdError> {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                let id: i32 = trimmed
                    .parse()
                    .map_err(|_| $crate::IdError::NotANumber(trimmed.to_owned()))?;
                if id <= 0 {
                    return Err($crate::IdError::NotPositive);
                }
                Ok(Self(id))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Integer ids issued by the marketplace API
define_id!(ListingId);
define_id!(TransactionId);

/// Identity-provider subject identifying a user (buyer, seller or admin).
///
/// The API stores it verbatim as the seller/buyer reference, so it is kept
/// as an opaque string. An empty value means "no signed-in user".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty placeholder id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
