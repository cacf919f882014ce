//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RAMM_API_BASE_URL` - Base URL of the marketplace REST API
//! - `COGNITO_USER_POOL_ID` - Identity provider user pool
//! - `COGNITO_CLIENT_ID` - Identity provider app client (public, no secret)
//!
//! ## Optional
//! - `COGNITO_REGION` - Pool region (default: us-east-1)
//! - `COGNITO_ENDPOINT` - Override of the provider endpoint (default derived from region)
//! - `RAMM_CONFIRM_USER_URL` - Out-of-band account confirmation endpoint
//! - `RAMM_ADMIN_EMAILS` - Comma-separated emails always routed to the admin view
//! - `RAMM_CDN_URL` - Prefix for listing image URLs
//! - `RAMM_SESSION_FILE` - Session store path (default: `<config dir>/ramm/session.json`)
//! - `RAMM_HTTP_TIMEOUT_SECS` - Per-request deadline in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_COGNITO_REGION: &str = "us-east-1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SESSION_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API
    pub api_base_url: Url,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Out-of-band confirm-user endpoint (optional)
    pub confirm_user_url: Option<Url>,
    /// Emails routed to the admin view after login (lower-cased)
    pub admin_emails: Vec<String>,
    /// Prefix for listing image URLs
    pub cdn_base_url: String,
    /// Location of the persistent session store
    pub session_file: PathBuf,
    /// Per-request deadline
    pub request_timeout: Duration,
}

/// Identity provider (Cognito user pool) configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// AWS region of the pool
    pub region: String,
    /// User pool id
    pub user_pool_id: String,
    /// App client id
    pub client_id: String,
    /// JSON API endpoint
    pub endpoint: Url,
}

impl ClientConfig {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base_url = parse_url("RAMM_API_BASE_URL", &get_required_env("RAMM_API_BASE_URL")?)?;
        let identity = IdentityConfig::from_env()?;

        let confirm_user_url = get_optional_env("RAMM_CONFIRM_USER_URL")
            .map(|raw| parse_url("RAMM_CONFIRM_USER_URL", &raw))
            .transpose()?;

        let admin_emails = get_optional_env("RAMM_ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        let cdn_base_url = get_env_or_default("RAMM_CDN_URL", "");

        let session_file = match get_optional_env("RAMM_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };

        let timeout_secs = get_env_or_default("RAMM_HTTP_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("RAMM_HTTP_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            api_base_url,
            identity,
            confirm_user_url,
            admin_emails,
            cdn_base_url,
            session_file,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Whether an email is on the admin allow-list (case-insensitive).
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let region = get_env_or_default("COGNITO_REGION", DEFAULT_COGNITO_REGION);
        let endpoint = match get_optional_env("COGNITO_ENDPOINT") {
            Some(raw) => parse_url("COGNITO_ENDPOINT", &raw)?,
            None => parse_url(
                "COGNITO_REGION",
                &format!("https://cognito-idp.{region}.amazonaws.com/"),
            )?,
        };

        Ok(Self {
            region,
            user_pool_id: get_required_env("COGNITO_USER_POOL_ID")?,
            client_id: get_required_env("COGNITO_CLIENT_ID")?,
            endpoint,
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("ramm").join(SESSION_FILE_NAME))
        .ok_or_else(|| ConfigError::MissingEnvVar("RAMM_SESSION_FILE".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            api_base_url: Url::parse("http://localhost:8000").unwrap(),
            identity: IdentityConfig {
                region: "us-east-1".to_string(),
                user_pool_id: "us-east-1_pool".to_string(),
                client_id: "client".to_string(),
                endpoint: Url::parse("https://cognito-idp.us-east-1.amazonaws.com/").unwrap(),
            },
            confirm_user_url: None,
            admin_emails: parse_email_list("Admin@Example.com, ops@example.com ,,"),
            cdn_base_url: String::new(),
            session_file: PathBuf::from("/tmp/session.json"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[test]
    fn test_parse_email_list_normalizes() {
        assert_eq!(
            parse_email_list("Admin@Example.com, ops@example.com ,,"),
            vec!["admin@example.com".to_string(), "ops@example.com".to_string()]
        );
    }

    #[test]
    fn test_is_admin_email_is_case_insensitive() {
        let config = config();
        assert!(config.is_admin_email("ADMIN@example.com"));
        assert!(config.is_admin_email(" ops@example.com "));
        assert!(!config.is_admin_email("buyer@example.com"));
    }

    #[test]
    fn test_parse_url_reports_variable() {
        let err = parse_url("RAMM_API_BASE_URL", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "RAMM_API_BASE_URL"));
    }
}
