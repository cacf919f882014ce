//! Authentication flow.
//!
//! ```text
//! Anonymous ─login─▶ Authenticating ─┬─▶ Authenticated
//!                                    ├─▶ ChallengeRequired ─new password─▶ Authenticating
//!                                    ├─▶ ConfirmationRecovery (account not confirmed)
//!                                    └─▶ Failed
//! ```
//!
//! The flow is the only writer of the session store. On success the id
//! token and the user's attributes are persisted and the caller is routed
//! by role.

use ramm_core::{Email, Role};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::identity::{
    AccountConfirmer, AuthResponse, AuthTokens, IdentityProvider, ProviderError,
};
use crate::routes::Route;
use crate::session::{Session, SessionError, SessionStore};

/// Shown after the account was confirmed out of band.
pub const ACCOUNT_CONFIRMED_MESSAGE: &str = "Your account has been confirmed. Please log in again.";

/// Shown when confirmation is submitted without a code.
pub const MISSING_CODE_MESSAGE: &str = "Please enter the confirmation code sent to your email.";

/// Errors from the authentication flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Signup failed: {0}")]
    Registration(#[source] ProviderError),

    #[error("{0}")]
    Authentication(#[source] ProviderError),

    #[error("No password change is pending")]
    NoChallenge,

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Where the flow currently stands.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating,
    /// The provider demands a new password before issuing tokens.
    ChallengeRequired { email: Email, session: SecretString },
    /// Login hit an unconfirmed account; an out-of-band confirmation was tried.
    ConfirmationRecovery { email: Email, outcome: RecoveryOutcome },
    Authenticated { route: Route },
    Failed { message: String },
}

/// Result of the out-of-band confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The account is now confirmed; the user should log in again.
    Confirmed,
    /// The confirm endpoint refused or could not be reached.
    Failed(String),
    /// No confirm endpoint is configured.
    Unavailable,
}

impl RecoveryOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Confirmed => ACCOUNT_CONFIRMED_MESSAGE.to_string(),
            Self::Failed(message) => format!("Error confirming account: {message}"),
            Self::Unavailable => {
                "Account not confirmed. Please confirm it with the code sent to your email.".to_string()
            }
        }
    }
}

/// Result of a login attempt that did not error.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Signed in. `route` is where the user lands.
    Authenticated { session: Session, route: Route },
    /// Call [`AuthFlow::complete_forced_password_change`] next.
    NewPasswordRequired,
    /// The account was unconfirmed; see the recovery outcome.
    ConfirmationRecovery(RecoveryOutcome),
}

/// Result of submitting a confirmation code. The caller always goes to
/// `/login` afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    MissingCode,
    Failed(String),
}

impl ConfirmationOutcome {
    /// Next route, whatever the outcome.
    #[must_use]
    pub const fn route(&self) -> Route {
        Route::Login
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Confirmed => "Account confirmed successfully!".to_string(),
            Self::MissingCode => MISSING_CODE_MESSAGE.to_string(),
            Self::Failed(message) => format!("Confirmation failed: {message}"),
        }
    }
}

/// Authentication state machine.
pub struct AuthFlow<P, C> {
    provider: P,
    confirmer: Option<C>,
    store: SessionStore,
    admin_emails: Vec<String>,
    state: AuthState,
}

impl<P, C> AuthFlow<P, C>
where
    P: IdentityProvider,
    C: AccountConfirmer,
{
    /// Create a flow. Without a confirmer, unconfirmed logins report
    /// [`RecoveryOutcome::Unavailable`].
    pub fn new(provider: P, confirmer: Option<C>, store: SessionStore) -> Self {
        Self {
            provider,
            confirmer,
            store,
            admin_emails: Vec::new(),
            state: AuthState::Anonymous,
        }
    }

    /// Emails always routed to the administration view (lower-cased).
    ///
    /// The list picks the landing route only; access is still decided by
    /// the role in [`crate::admin::AdminView::open`].
    #[must_use]
    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = emails;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    /// Register and remember the email for the confirmation page.
    ///
    /// Only buyer and seller can be chosen.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input and a registration error
    /// when the provider rejects the account.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<Route, AuthError> {
        let email = parse_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::Validation("Please enter a password.".to_string()));
        }
        if !role.is_self_assignable() {
            return Err(AuthError::Validation(format!(
                "Role {role} cannot be chosen at signup."
            )));
        }

        self.provider
            .sign_up(&email, password, role)
            .await
            .map_err(AuthError::Registration)?;
        self.store.set_pending_confirmation(email.as_str())?;
        info!(%email, %role, "Account created, awaiting confirmation");
        Ok(Route::Confirmation)
    }

    /// Submit a confirmation code. Never blocks the user: failures are
    /// reported in the outcome and the next route is still `/login`.
    #[instrument(skip(self, code))]
    pub async fn confirm_registration(&mut self, email: &str, code: &str) -> ConfirmationOutcome {
        let code = code.trim();
        if code.is_empty() {
            return ConfirmationOutcome::MissingCode;
        }
        let email = match parse_email(email) {
            Ok(email) => email,
            Err(e) => return ConfirmationOutcome::Failed(e.to_string()),
        };

        match self.provider.confirm_registration(&email, code).await {
            Ok(()) => {
                info!(%email, "Registration confirmed");
                ConfirmationOutcome::Confirmed
            }
            Err(e) => {
                warn!(%email, error = %e, "Registration confirmation failed");
                ConfirmationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Email to prefill on the login form, consumed from the pending hint.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be accessed.
    pub fn prefill_email(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store.take_pending_confirmation()?)
    }

    /// Password login.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input, provider rejections other than
    /// an unconfirmed account, or a session store failure.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &SecretString) -> Result<LoginOutcome, AuthError> {
        let email = match parse_email(email) {
            Ok(email) => email,
            Err(e) => return Err(self.fail(e)),
        };
        self.state = AuthState::Authenticating;

        match self.provider.authenticate(&email, password).await {
            Ok(AuthResponse::Authenticated(tokens)) => self.establish(&email, &tokens).await,
            Ok(AuthResponse::NewPasswordRequired { session }) => {
                info!(%email, "New password required");
                self.state = AuthState::ChallengeRequired { email, session };
                Ok(LoginOutcome::NewPasswordRequired)
            }
            Err(e) if e.is_user_not_confirmed() => {
                let outcome = self.recover_unconfirmed(&email).await;
                self.state = AuthState::ConfirmationRecovery {
                    email,
                    outcome: outcome.clone(),
                };
                Ok(LoginOutcome::ConfirmationRecovery(outcome))
            }
            Err(e) => Err(self.fail(AuthError::Authentication(e))),
        }
    }

    /// Answer the forced password-change challenge. Only valid right after
    /// [`LoginOutcome::NewPasswordRequired`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoChallenge`] when no challenge is pending, or
    /// the provider's rejection.
    #[instrument(skip(self, new_password))]
    pub async fn complete_forced_password_change(
        &mut self,
        new_password: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        let AuthState::ChallengeRequired { email, session } = std::mem::take(&mut self.state) else {
            return Err(AuthError::NoChallenge);
        };
        if new_password.expose_secret().is_empty() {
            self.state = AuthState::ChallengeRequired { email, session };
            return Err(AuthError::Validation("Please enter a new password.".to_string()));
        }

        self.state = AuthState::Authenticating;
        match self
            .provider
            .complete_new_password(&email, new_password, &session)
            .await
        {
            Ok(tokens) => self.establish(&email, &tokens).await,
            Err(e) => Err(self.fail(AuthError::Authentication(e))),
        }
    }

    /// Forget the session locally. The provider is not contacted.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    #[instrument(skip(self))]
    pub fn logout(&mut self) -> Result<Route, AuthError> {
        self.store.clear()?;
        self.state = AuthState::Anonymous;
        info!("Logged out");
        Ok(Route::Login)
    }

    /// Fetch attributes, persist the session and pick the landing route.
    async fn establish(&mut self, email: &Email, tokens: &AuthTokens) -> Result<LoginOutcome, AuthError> {
        let attributes = match self.provider.user_attributes(tokens).await {
            Ok(attributes) => attributes,
            Err(e) => {
                warn!(error = %e, "Could not fetch user attributes, continuing with defaults");
                ramm_core::UserAttributes::default()
            }
        };

        let session = Session::new(tokens.id_token.clone(), attributes);
        if let Err(e) = self.store.save(&session) {
            return Err(self.fail(e.into()));
        }

        let route = self.landing_route(email, &session);
        info!(%email, role = %session.role(), %route, "Logged in");
        self.state = AuthState::Authenticated {
            route: route.clone(),
        };
        Ok(LoginOutcome::Authenticated { session, route })
    }

    fn landing_route(&self, email: &Email, session: &Session) -> Route {
        let normalized = email.normalized();
        if session.is_admin() || self.admin_emails.iter().any(|admin| *admin == normalized) {
            Route::Admin
        } else {
            Route::Products
        }
    }

    async fn recover_unconfirmed(&self, email: &Email) -> RecoveryOutcome {
        let Some(confirmer) = &self.confirmer else {
            warn!(%email, "Account not confirmed and no confirm endpoint configured");
            return RecoveryOutcome::Unavailable;
        };

        info!(%email, "Account not confirmed, attempting automatic confirmation");
        match confirmer.confirm_user(email.as_str()).await {
            Ok(()) => RecoveryOutcome::Confirmed,
            Err(ProviderError::Network(e)) => {
                warn!(error = %e, "Confirm endpoint unreachable");
                RecoveryOutcome::Failed("network error, please try again.".to_string())
            }
            Err(e) => {
                warn!(error = %e, "Automatic confirmation failed");
                RecoveryOutcome::Failed(e.to_string())
            }
        }
    }

    fn fail(&mut self, error: AuthError) -> AuthError {
        self.state = AuthState::Failed {
            message: error.to_string(),
        };
        error
    }
}

fn parse_email(input: &str) -> Result<Email, AuthError> {
    Email::parse(input).map_err(|e| AuthError::Validation(format!("Please enter a valid email: {e}.")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use ramm_core::UserAttributes;

    use super::*;

    #[derive(Default)]
    struct MockProvider {
        challenge: bool,
        unconfirmed: bool,
        reject_password: bool,
        role: &'static str,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockProvider {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn tokens() -> AuthTokens {
            AuthTokens {
                id_token: SecretString::from("id-token"),
                access_token: SecretString::from("access-token"),
                refresh_token: None,
            }
        }
    }

    impl IdentityProvider for MockProvider {
        async fn sign_up(&self, email: &Email, _: &SecretString, _: Role) -> Result<(), ProviderError> {
            self.record("sign_up");
            if email.as_str() == "taken@example.com" {
                return Err(ProviderError::Service {
                    code: "UsernameExistsException".to_string(),
                    message: "An account with the given email already exists.".to_string(),
                });
            }
            Ok(())
        }

        async fn confirm_registration(&self, _: &Email, code: &str) -> Result<(), ProviderError> {
            self.record("confirm_registration");
            if code == "000000" {
                return Err(ProviderError::Service {
                    code: "CodeMismatchException".to_string(),
                    message: "Invalid verification code provided, please try again.".to_string(),
                });
            }
            Ok(())
        }

        async fn authenticate(&self, _: &Email, _: &SecretString) -> Result<AuthResponse, ProviderError> {
            self.record("authenticate");
            if self.unconfirmed {
                return Err(ProviderError::Service {
                    code: crate::identity::USER_NOT_CONFIRMED.to_string(),
                    message: "User is not confirmed.".to_string(),
                });
            }
            if self.reject_password {
                return Err(ProviderError::Service {
                    code: "NotAuthorizedException".to_string(),
                    message: "Incorrect username or password.".to_string(),
                });
            }
            if self.challenge {
                return Ok(AuthResponse::NewPasswordRequired {
                    session: SecretString::from("challenge"),
                });
            }
            Ok(AuthResponse::Authenticated(Self::tokens()))
        }

        async fn complete_new_password(
            &self,
            _: &Email,
            _: &SecretString,
            session: &SecretString,
        ) -> Result<AuthTokens, ProviderError> {
            self.record("complete_new_password");
            assert_eq!(session.expose_secret(), "challenge");
            Ok(Self::tokens())
        }

        async fn user_attributes(&self, _: &AuthTokens) -> Result<UserAttributes, ProviderError> {
            self.record("user_attributes");
            Ok(UserAttributes::from_pairs([
                ("sub", "user-1"),
                ("email", "user@example.com"),
                ("custom:role", self.role),
            ]))
        }
    }

    struct MockConfirmer {
        succeed: bool,
    }

    impl AccountConfirmer for MockConfirmer {
        async fn confirm_user(&self, _: &str) -> Result<(), ProviderError> {
            if self.succeed {
                Ok(())
            } else {
                Err(ProviderError::Service {
                    code: "HTTP500".to_string(),
                    message: "Unknown error".to_string(),
                })
            }
        }
    }

    fn flow(provider: MockProvider, confirmer: Option<MockConfirmer>) -> (tempfile::TempDir, AuthFlow<MockProvider, MockConfirmer>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        (dir, AuthFlow::new(provider, confirmer, store))
    }

    fn password() -> SecretString {
        SecretString::from("hunter22")
    }

    #[tokio::test]
    async fn test_login_persists_session_and_routes_by_role() {
        let (_dir, mut flow) = flow(
            MockProvider {
                role: "seller",
                ..MockProvider::default()
            },
            None,
        );
        let outcome = flow.login("user@example.com", &password()).await.unwrap();
        let LoginOutcome::Authenticated { session, route } = outcome else {
            panic!("expected authenticated");
        };
        assert_eq!(route, Route::Products);
        assert_eq!(session.role(), Role::Seller);

        let stored = flow.store.load().unwrap();
        assert_eq!(stored.token().unwrap().expose_secret(), "id-token");
        assert_eq!(stored.user_id().as_str(), "user-1");
        assert!(matches!(flow.state(), AuthState::Authenticated { .. }));
    }

    #[tokio::test]
    async fn test_admin_role_routes_to_admin() {
        let (_dir, mut flow) = flow(
            MockProvider {
                role: "Admin",
                ..MockProvider::default()
            },
            None,
        );
        let outcome = flow.login("user@example.com", &password()).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Authenticated { route: Route::Admin, .. }));
    }

    #[tokio::test]
    async fn test_admin_email_routes_to_admin() {
        let (_dir, flow) = flow(
            MockProvider {
                role: "buyer",
                ..MockProvider::default()
            },
            None,
        );
        let mut flow = flow.with_admin_emails(vec!["admin@example.com".to_string()]);
        let outcome = flow.login("Admin@Example.com", &password()).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Authenticated { route: Route::Admin, .. }));
    }

    #[tokio::test]
    async fn test_forced_password_change() {
        let (_dir, mut flow) = flow(
            MockProvider {
                challenge: true,
                role: "buyer",
                ..MockProvider::default()
            },
            None,
        );
        let outcome = flow.login("user@example.com", &password()).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::NewPasswordRequired));
        assert!(matches!(flow.state(), AuthState::ChallengeRequired { .. }));

        let outcome = flow
            .complete_forced_password_change(&SecretString::from("n3w-password"))
            .await
            .unwrap();
        assert!(matches!(outcome, LoginOutcome::Authenticated { route: Route::Products, .. }));
        assert!(flow.store.load().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_password_change_without_challenge() {
        let (_dir, mut flow) = flow(MockProvider::default(), None);
        let err = flow
            .complete_forced_password_change(&password())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoChallenge));
    }

    #[tokio::test]
    async fn test_unconfirmed_account_enters_recovery() {
        let (_dir, mut flow) = flow(
            MockProvider {
                unconfirmed: true,
                ..MockProvider::default()
            },
            Some(MockConfirmer { succeed: true }),
        );
        let outcome = flow.login("user@example.com", &password()).await.unwrap();
        assert!(matches!(
            outcome,
            LoginOutcome::ConfirmationRecovery(RecoveryOutcome::Confirmed)
        ));
        assert_eq!(RecoveryOutcome::Confirmed.message(), ACCOUNT_CONFIRMED_MESSAGE);
        assert!(!flow.store.load().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_unconfirmed_account_without_confirmer() {
        let (_dir, mut flow) = flow(
            MockProvider {
                unconfirmed: true,
                ..MockProvider::default()
            },
            None,
        );
        let outcome = flow.login("user@example.com", &password()).await.unwrap();
        assert!(matches!(
            outcome,
            LoginOutcome::ConfirmationRecovery(RecoveryOutcome::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_rejected_password_fails_with_provider_message() {
        let (_dir, mut flow) = flow(
            MockProvider {
                reject_password: true,
                ..MockProvider::default()
            },
            Some(MockConfirmer { succeed: false }),
        );
        let err = flow.login("user@example.com", &password()).await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect username or password.");
        assert!(matches!(flow.state(), AuthState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_sign_up_sets_pending_confirmation() {
        let (_dir, mut flow) = flow(MockProvider::default(), None);
        let route = flow
            .sign_up("new@example.com", &password(), Role::Seller)
            .await
            .unwrap();
        assert_eq!(route, Route::Confirmation);
        assert_eq!(flow.prefill_email().unwrap().as_deref(), Some("new@example.com"));
        assert_eq!(flow.prefill_email().unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_admin_role_without_calling_provider() {
        let (_dir, mut flow) = flow(MockProvider::default(), None);
        let err = flow
            .sign_up("new@example.com", &password(), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(flow.provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_account() {
        let (_dir, mut flow) = flow(MockProvider::default(), None);
        let err = flow
            .sign_up("taken@example.com", &password(), Role::Buyer)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Signup failed: An account with the given email already exists."
        );
    }

    #[tokio::test]
    async fn test_confirmation_always_routes_to_login() {
        let (_dir, mut flow) = flow(MockProvider::default(), None);

        let ok = flow.confirm_registration("user@example.com", "123456").await;
        assert_eq!(ok, ConfirmationOutcome::Confirmed);

        let failed = flow.confirm_registration("user@example.com", "000000").await;
        assert!(matches!(failed, ConfirmationOutcome::Failed(_)));

        let missing = flow.confirm_registration("user@example.com", "  ").await;
        assert_eq!(missing, ConfirmationOutcome::MissingCode);
        assert_eq!(missing.message(), MISSING_CODE_MESSAGE);

        for outcome in [ok, failed, missing] {
            assert_eq!(outcome.route(), Route::Login);
        }
        assert_eq!(flow.provider.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (_dir, mut flow) = flow(
            MockProvider {
                role: "buyer",
                ..MockProvider::default()
            },
            None,
        );
        flow.login("user@example.com", &password()).await.unwrap();
        assert_eq!(flow.logout().unwrap(), Route::Login);
        assert!(!flow.store.load().unwrap().is_authenticated());
        assert!(matches!(flow.state(), AuthState::Anonymous));
    }
}
