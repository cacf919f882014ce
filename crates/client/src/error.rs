//! Unified error handling for client operations.
//!
//! Every view catches its own errors and renders them; nothing is retried.
//! The variants follow the four failure classes a user can see:
//! validation (caught before any request), backend (error status with a
//! detail message), network (request never completed) and unexpected.

use ramm_core::{EmailError, IdError, PriceError};
use thiserror::Error;

use crate::session::SessionError;

/// Error returned by API calls and view operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected client-side; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The API answered with an error status.
    #[error("Backend error ({status}): {detail}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body, or the raw body.
        detail: String,
    },

    /// The request did not complete (connect, timeout, transport).
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered successfully but the body was not what we expected.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Local session store failure.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Coarse classification used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-side validation.
    Validation,
    /// Error status from the API.
    Backend,
    /// Transport failure.
    Network,
    /// Anything else.
    Unexpected,
}

impl ClientError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Network(_) => ErrorKind::Network,
            Self::InvalidResponse(_) | Self::Session(_) => ErrorKind::Unexpected,
        }
    }

    /// HTTP status for backend errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message shown to the user, prefixed with the failed action.
    ///
    /// Validation messages are shown as-is; backend details are surfaced
    /// verbatim.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Backend { detail, .. } => format!("{action}: {detail}"),
            Self::Network(_) => format!("{action}: network error, please retry."),
            Self::InvalidResponse(_) => format!("{action}: invalid response from server."),
            Self::Session(e) => format!("{action}: {e}"),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::Backend {
                status: status.as_u16(),
                detail: e.to_string(),
            };
        }
        if e.is_decode() {
            return Self::InvalidResponse(e.to_string());
        }
        Self::Network(e.to_string())
    }
}

impl From<PriceError> for ClientError {
    fn from(e: PriceError) -> Self {
        Self::Validation(format!("Please enter a valid price: {e}."))
    }
}

impl From<IdError> for ClientError {
    fn from(e: IdError) -> Self {
        Self::Validation(format!("Please enter a valid id: {e}."))
    }
}

impl From<EmailError> for ClientError {
    fn from(e: EmailError) -> Self {
        Self::Validation(format!("Please enter a valid email: {e}."))
    }
}
