//! RAMM Shop Core - Shared domain types.
//!
//! This crate provides the records exchanged with the marketplace API and the
//! small value types they are built from. It is shared by `ramm-client`
//! (API, identity provider, session and views) and `ramm-cli`.
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. The client owns no authoritative data; these
//! types describe what the API returns and what the user submits.
//!
//! # Modules
//!
//! - [`types`] - Ids, email, price, role/status enums, listings, orders, users

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
