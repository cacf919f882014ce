//! Core types for RAMM Shop.
//!
//! This module provides type-safe wrappers for the marketplace domain.

pub mod email;
pub mod id;
pub mod listing;
pub mod order;
pub mod price;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use listing::{Listing, ListingUpdate};
pub use order::Order;
pub use price::{Price, PriceError};
pub use status::*;
pub use user::{UserAttributes, UserSummary};
