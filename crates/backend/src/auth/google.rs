//! Google OAuth2 authorization code flow, provider side.
//!
//! [`OAuthProvider`] is the seam the provisioning flow depends on:
//! 1. Exchange the authorization code for a provider access token
//! 2. Fetch user info from the userinfo endpoint with that token

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const LOGIN_SCOPES: &str = "https://www.googleapis.com/auth/userinfo.email \
                            https://www.googleapis.com/auth/userinfo.profile openid";

/// Identity returned by the userinfo endpoint. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
    /// Provider's stable user identifier (the "sub" claim)
    #[serde(rename = "sub")]
    pub subject: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Trade an authorization code for a provider access token.
    ///
    /// `Ok(None)` means the provider answered but gave no usable token.
    async fn exchange_code(&self, code: &str) -> Result<Option<String>, ProviderError>;

    async fn fetch_user_info(&self, access_token: &str)
        -> Result<ProviderIdentity, ProviderError>;
}

/// Build the consent-screen URL the browser is sent to.
///
/// Carries no `state` and no PKCE challenge.
pub fn authorization_url(config: &GoogleConfig) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}",
        GOOGLE_AUTH_URL,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(LOGIN_SCOPES),
    )
}

/// Google OAuth2 client over reqwest
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http_client: builder.build()?,
        })
    }

    /// Point the client at different token/userinfo endpoints.
    #[cfg(test)]
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Token exchange returned {}: {}", status, body);
        }

        // The token is taken from the body whatever the status; a body that
        // is not JSON or lacks the field simply yields no token.
        let token = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| {
                json.get("access_token")
                    .and_then(|t| t.as_str())
                    .map(str::to_string)
            })
            .filter(|t| !t.is_empty());

        Ok(token)
    }

    async fn fetch_user_info(
        &self,
        access_token: &str,
    ) -> Result<ProviderIdentity, ProviderError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
