//! Cognito user pool client over the JSON 1.1 API.
//!
//! Every action is a `POST` to the regional endpoint with an
//! `X-Amz-Target` header naming the action. Public app clients need no
//! request signing; `USER_PASSWORD_AUTH` must be enabled on the client.

use std::sync::Arc;
use std::time::Duration;

use ramm_core::{Email, Role, UserAttributes, user::attr};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{AccountConfirmer, AuthResponse, AuthTokens, IdentityProvider, ProviderError};
use crate::config::IdentityConfig;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";

/// Cognito identity provider client.
#[derive(Clone)]
pub struct CognitoClient {
    inner: Arc<CognitoClientInner>,
}

struct CognitoClientInner {
    client: reqwest::Client,
    endpoint: Url,
    client_id: String,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

#[derive(Serialize)]
struct PasswordAuthParameters<'a> {
    #[serde(rename = "USERNAME")]
    username: &'a str,
    #[serde(rename = "PASSWORD")]
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    client_id: &'a str,
    auth_flow: &'a str,
    auth_parameters: PasswordAuthParameters<'a>,
}

#[derive(Serialize)]
struct NewPasswordResponses<'a> {
    #[serde(rename = "USERNAME")]
    username: &'a str,
    #[serde(rename = "NEW_PASSWORD")]
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToAuthChallengeRequest<'a> {
    client_id: &'a str,
    challenge_name: &'a str,
    session: &'a str,
    challenge_responses: NewPasswordResponses<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
    #[serde(default)]
    session: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

/// Cognito error body: `{"__type": "...#Code", "message": "..."}`.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

impl From<AuthenticationResult> for AuthTokens {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            id_token: SecretString::from(result.id_token),
            access_token: SecretString::from(result.access_token),
            refresh_token: result.refresh_token.map(SecretString::from),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

impl CognitoClient {
    /// Create a client for the configured user pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(CognitoClientInner {
                client,
                endpoint: config.endpoint.clone(),
                client_id: config.client_id.clone(),
            }),
        })
    }

    /// Invoke one provider action.
    async fn call<B, T>(&self, action: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&bytes)
                .map_err(|e| ProviderError::InvalidResponse(format!("{action}: {e}")));
        }

        let error = parse_error(&bytes, status.as_u16());
        warn!(action, status = status.as_u16(), code = ?error.code(), "Identity provider call failed");
        Err(error)
    }
}

impl std::fmt::Debug for CognitoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("client_id", &self.inner.client_id)
            .finish_non_exhaustive()
    }
}

impl IdentityProvider for CognitoClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        role: Role,
    ) -> Result<(), ProviderError> {
        let request = SignUpRequest {
            client_id: &self.inner.client_id,
            username: email.as_str(),
            password: password.expose_secret(),
            user_attributes: vec![
                AttributeType {
                    name: attr::EMAIL,
                    value: email.as_str(),
                },
                AttributeType {
                    name: attr::ROLE,
                    value: role.as_str(),
                },
            ],
        };
        let _: IgnoredAny = self.call("SignUp", &request).await?;
        debug!("Account registered");
        Ok(())
    }

    #[instrument(skip(self, code), fields(email = %email))]
    async fn confirm_registration(&self, email: &Email, code: &str) -> Result<(), ProviderError> {
        let request = ConfirmSignUpRequest {
            client_id: &self.inner.client_id,
            username: email.as_str(),
            confirmation_code: code,
        };
        let _: IgnoredAny = self.call("ConfirmSignUp", &request).await?;
        Ok(())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ProviderError> {
        let request = InitiateAuthRequest {
            client_id: &self.inner.client_id,
            auth_flow: "USER_PASSWORD_AUTH",
            auth_parameters: PasswordAuthParameters {
                username: email.as_str(),
                password: password.expose_secret(),
            },
        };
        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;

        if let Some(result) = response.authentication_result {
            return Ok(AuthResponse::Authenticated(result.into()));
        }

        match (response.challenge_name.as_deref(), response.session) {
            (Some(NEW_PASSWORD_REQUIRED), Some(session)) => Ok(AuthResponse::NewPasswordRequired {
                session: SecretString::from(session),
            }),
            (Some(other), _) => Err(ProviderError::InvalidResponse(format!(
                "Unsupported challenge: {other}"
            ))),
            (None, _) => Err(ProviderError::InvalidResponse(
                "Neither tokens nor a challenge were returned".to_string(),
            )),
        }
    }

    #[instrument(skip(self, new_password, session), fields(email = %email))]
    async fn complete_new_password(
        &self,
        email: &Email,
        new_password: &SecretString,
        session: &SecretString,
    ) -> Result<AuthTokens, ProviderError> {
        let request = RespondToAuthChallengeRequest {
            client_id: &self.inner.client_id,
            challenge_name: NEW_PASSWORD_REQUIRED,
            session: session.expose_secret(),
            challenge_responses: NewPasswordResponses {
                username: email.as_str(),
                new_password: new_password.expose_secret(),
            },
        };
        let response: InitiateAuthResponse = self.call("RespondToAuthChallenge", &request).await?;
        response
            .authentication_result
            .map(AuthTokens::from)
            .ok_or_else(|| ProviderError::InvalidResponse("No tokens after password change".to_string()))
    }

    #[instrument(skip(self, tokens))]
    async fn user_attributes(&self, tokens: &AuthTokens) -> Result<UserAttributes, ProviderError> {
        let request = GetUserRequest {
            access_token: tokens.access_token.expose_secret(),
        };
        let response: GetUserResponse = self.call("GetUser", &request).await?;
        Ok(UserAttributes::from_pairs(
            response.user_attributes.into_iter().map(|a| (a.name, a.value)),
        ))
    }
}

fn parse_error(body: &[u8], status: u16) -> ProviderError {
    let parsed: Option<ErrorResponse> = serde_json::from_slice(body).ok();
    let (error_type, message) = parsed
        .map(|e| (e.error_type, e.message))
        .unwrap_or_default();

    // `__type` may carry a namespace: `aws.cognito#UserNotConfirmedException`.
    let code = error_type
        .as_deref()
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
        .unwrap_or_else(|| format!("HTTP{status}"));
    let message = message.unwrap_or_else(|| code.clone());

    ProviderError::Service { code, message }
}

// =============================================================================
// Out-of-band confirmation
// =============================================================================

/// Client of the bespoke confirm-user endpoint.
#[derive(Debug, Clone)]
pub struct HttpAccountConfirmer {
    client: reqwest::Client,
    url: Url,
    user_pool_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmUserRequest<'a> {
    username: &'a str,
    user_pool_id: &'a str,
}

impl HttpAccountConfirmer {
    /// Create a confirmer posting to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(url: Url, user_pool_id: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url,
            user_pool_id: user_pool_id.into(),
        })
    }
}

impl AccountConfirmer for HttpAccountConfirmer {
    #[instrument(skip(self))]
    async fn confirm_user(&self, username: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&ConfirmUserRequest {
                username,
                user_pool_id: &self.user_pool_id,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Account confirmed out of band");
            return Ok(());
        }

        let bytes = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorResponse>(&bytes)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        Err(ProviderError::Service {
            code: format!("HTTP{}", status.as_u16()),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_strips_namespace() {
        let body = br#"{"__type":"aws.cognito#UserNotConfirmedException","message":"User is not confirmed."}"#;
        let err = parse_error(body, 400);
        assert!(err.is_user_not_confirmed());
        assert_eq!(err.to_string(), "User is not confirmed.");
    }

    #[test]
    fn test_parse_error_accepts_capitalized_message() {
        let body = br#"{"__type":"UsernameExistsException","Message":"An account with the given email already exists."}"#;
        let err = parse_error(body, 400);
        assert_eq!(err.code(), Some("UsernameExistsException"));
        assert_eq!(err.to_string(), "An account with the given email already exists.");
    }

    #[test]
    fn test_parse_error_without_body() {
        let err = parse_error(b"", 503);
        assert_eq!(err.code(), Some("HTTP503"));
    }

    #[test]
    fn test_sign_up_request_shape() {
        let request = SignUpRequest {
            client_id: "client",
            username: "a@example.com",
            password: "pw",
            user_attributes: vec![AttributeType {
                name: attr::ROLE,
                value: "seller",
            }],
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(json["ClientId"], "client");
        assert_eq!(json["UserAttributes"][0]["Name"], "custom:role");
        assert_eq!(json["UserAttributes"][0]["Value"], "seller");
    }
}
