//! RAMM Shop client - marketplace API orchestration.
//!
//! This crate is the client side of the marketplace: it talks to the REST
//! API and to the identity provider, keeps the signed-in session, and
//! implements every view as a plain struct with async operations.
//!
//! # Architecture
//!
//! - [`session::SessionStore`] persists the token and cached attributes; the
//!   [`session::Session`] is loaded once and passed explicitly to each view
//! - [`api::ApiClient`] is a thin `reqwest` wrapper with one method per endpoint
//! - [`auth::AuthFlow`] is the only writer of the session store
//! - Views: [`listings::ListingCollection`] (browse and search),
//!   [`create::CreationFlow`], [`orders::OrdersView`],
//!   [`finalize::FinalizationView`], [`admin::AdminView`]
//! - [`routes::Route`] maps paths to views
//!
//! # Trust boundary
//!
//! Role checks in this crate decide what to *offer*, nothing more. The API
//! is expected to enforce ownership and per-role permissions itself.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod create;
pub mod error;
pub mod finalize;
pub mod identity;
pub mod listings;
pub mod orders;
pub mod routes;
pub mod session;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind};
pub use routes::Route;
pub use session::{Session, SessionStore};
