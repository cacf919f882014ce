//! Persistent session state.
//!
//! The store is a flat string map saved as JSON on disk. Three keys are used:
//!
//! | Key | Value |
//! |---|---|
//! | `token` | identity-provider id token |
//! | `user` | JSON-encoded attribute map |
//! | `pendingConfirmation` | email awaiting confirmation (removed after read) |
//!
//! The [`Session`] is loaded once at start-up and handed to each view. Only
//! [`crate::auth::AuthFlow`] writes it back.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ramm_core::{Role, UserAttributes, UserId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument, warn};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";
const PENDING_CONFIRMATION_KEY: &str = "pendingConfirmation";

/// Errors from the on-disk session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding a string → string map.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole map. A missing file reads as empty; an unreadable
    /// document is logged and treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure other than "not found".
    pub fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Read one key.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    /// Apply `f` to the map and write it back atomically.
    fn update<F>(&self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut map = self.read_all()?;
        f(&mut map);
        self.write_all(&map)
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

/// The signed-in user's token and cached identity attributes.
///
/// A default session is anonymous: no token, role buyer, empty ids.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    attributes: UserAttributes,
}

impl Session {
    /// Session for a freshly authenticated user.
    #[must_use]
    pub const fn new(token: SecretString, attributes: UserAttributes) -> Self {
        Self {
            token: Some(token),
            attributes,
        }
    }

    /// Bearer token, if signed in.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Whether a token is present. The token itself is never validated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Cached attributes.
    #[must_use]
    pub const fn attributes(&self) -> &UserAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.attributes.user_id()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.attributes.email()
    }

    /// Role with the buyer fallback applied.
    #[must_use]
    pub fn role(&self) -> Role {
        self.attributes.role()
    }

    /// Role string as cached, before any fallback.
    #[must_use]
    pub fn raw_role(&self) -> Option<&str> {
        self.attributes.raw_role()
    }

    /// Whether the cached role is `admin`, ignoring case.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.raw_role()
            .is_some_and(|role| role.trim().eq_ignore_ascii_case(Role::Admin.as_str()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Session persistence on top of [`LocalStore`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: LocalStore,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: LocalStore::new(path),
        }
    }

    /// Load the session.
    ///
    /// Absent or garbled state yields the default session; only I/O
    /// failures are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Session, SessionError> {
        let mut map = self.store.read_all()?;

        let token = map
            .remove(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let attributes = match map.remove(USER_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Cached user attributes are unreadable, using defaults");
                UserAttributes::default()
            }),
            None => UserAttributes::default(),
        };

        debug!(authenticated = token.is_some(), "Session loaded");
        Ok(Session { token, attributes })
    }

    /// Persist token and attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, session))]
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let user = serde_json::to_string(&session.attributes)?;
        let token = session
            .token
            .as_ref()
            .map(|t| t.expose_secret().to_owned());

        self.store.update(|map| {
            match token {
                Some(token) => map.insert(TOKEN_KEY.to_string(), token),
                None => map.remove(TOKEN_KEY),
            };
            map.insert(USER_KEY.to_string(), user);
        })?;
        debug!("Session saved");
        Ok(())
    }

    /// Remove token and attributes (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.update(|map| {
            map.remove(TOKEN_KEY);
            map.remove(USER_KEY);
        })
    }

    /// Remember the email awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn set_pending_confirmation(&self, email: &str) -> Result<(), SessionError> {
        self.store.update(|map| {
            map.insert(PENDING_CONFIRMATION_KEY.to_string(), email.to_string());
        })
    }

    /// Read and remove the pending-confirmation email.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn take_pending_confirmation(&self) -> Result<Option<String>, SessionError> {
        let mut pending = None;
        if self.store.get(PENDING_CONFIRMATION_KEY)?.is_none() {
            return Ok(None);
        }
        self.store.update(|map| {
            pending = map.remove(PENDING_CONFIRMATION_KEY);
        })?;
        Ok(pending.filter(|email| !email.is_empty()))
    }

    /// Underlying key/value store.
    #[must_use]
    pub const fn local_store(&self) -> &LocalStore {
        &self.store
    }
}
