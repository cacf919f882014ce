//! Identity provider integration.
//!
//! The provider owns credentials, token issuance and password challenges.
//! This module only defines the operations the authentication flow needs;
//! [`cognito::CognitoClient`] implements them over the Cognito JSON API.

pub mod cognito;

use std::future::Future;

use ramm_core::{Email, Role, UserAttributes};
use secrecy::SecretString;
use thiserror::Error;

pub use cognito::{CognitoClient, HttpAccountConfirmer};

/// Provider error code for an account that has not confirmed its email.
pub const USER_NOT_CONFIRMED: &str = "UserNotConfirmedException";

/// Errors reported by the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the call. `message` is shown verbatim.
    #[error("{message}")]
    Service { code: String, message: String },

    /// Transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with something we could not read.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Provider error code, e.g. `UsernameExistsException`.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the account exists but has not been confirmed.
    #[must_use]
    pub fn is_user_not_confirmed(&self) -> bool {
        self.code() == Some(USER_NOT_CONFIRMED)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Tokens issued on successful authentication.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    /// Identity token; this is what the session stores.
    pub id_token: SecretString,
    /// Access token, used to read the user's attributes.
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

/// Outcome of a password authentication.
#[derive(Debug, Clone)]
pub enum AuthResponse {
    Authenticated(AuthTokens),
    /// The provider requires a new password before issuing tokens.
    NewPasswordRequired {
        /// Opaque challenge session to answer with.
        session: SecretString,
    },
}

/// Operations consumed from the identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Register a new account carrying the role attribute.
    fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        role: Role,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Confirm a registration with the emailed code.
    fn confirm_registration(
        &self,
        email: &Email,
        code: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Authenticate with email and password.
    fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<AuthResponse, ProviderError>> + Send;

    /// Answer a forced password-change challenge.
    fn complete_new_password(
        &self,
        email: &Email,
        new_password: &SecretString,
        session: &SecretString,
    ) -> impl Future<Output = Result<AuthTokens, ProviderError>> + Send;

    /// Attributes of the authenticated user.
    fn user_attributes(
        &self,
        tokens: &AuthTokens,
    ) -> impl Future<Output = Result<UserAttributes, ProviderError>> + Send;
}

/// Privileged out-of-band account confirmation.
pub trait AccountConfirmer: Send + Sync {
    /// Mark `username` confirmed without a code.
    fn confirm_user(&self, username: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;
}
