//! Shared handles for every command.

use ramm_client::auth::AuthFlow;
use ramm_client::identity::{CognitoClient, HttpAccountConfirmer};
use ramm_client::{ApiClient, ClientConfig, ClientError, Session, SessionStore};

/// Configuration, API client and session store built once per invocation.
pub struct Context {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub store: SessionStore,
}

impl Context {
    /// Load configuration from the environment and build the clients.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = ClientConfig::from_env()?;
        let api = ApiClient::from_config(&config)?;
        let store = SessionStore::new(config.session_file.clone());
        tracing::debug!(api = %config.api_base_url, session_file = %config.session_file.display(), "Configuration loaded");
        Ok(Self { config, api, store })
    }

    /// The persisted session; anonymous when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn session(&self) -> Result<Session, ClientError> {
        Ok(self.store.load()?)
    }

    /// The persisted session, required to be signed in.
    ///
    /// # Errors
    ///
    /// Returns a validation error when nobody is signed in.
    pub fn signed_in(&self) -> Result<Session, ClientError> {
        let session = self.session()?;
        if !session.is_authenticated() {
            return Err(ClientError::validation(
                "You are not signed in. Run `ramm login` first.",
            ));
        }
        Ok(session)
    }

    /// Authentication flow against the configured identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider clients cannot be built.
    pub fn auth_flow(
        &self,
    ) -> Result<AuthFlow<CognitoClient, HttpAccountConfirmer>, Box<dyn std::error::Error>> {
        let provider = CognitoClient::new(&self.config.identity, self.config.request_timeout)?;
        let confirmer = self
            .config
            .confirm_user_url
            .clone()
            .map(|url| {
                HttpAccountConfirmer::new(
                    url,
                    self.config.identity.user_pool_id.clone(),
                    self.config.request_timeout,
                )
            })
            .transpose()?;

        Ok(AuthFlow::new(provider, confirmer, self.store.clone())
            .with_admin_emails(self.config.admin_emails.clone()))
    }
}
