//! Google login: code exchange, identity fetch, account lookup-or-create,
//! token issuance.
//!
//! A callback moves through
//! `CallbackReceived -> TokenExchanged -> IdentityFetched -> AccountResolved -> TokenIssued`
//! and either yields a [`CallbackOutcome`] carrying the client redirect or
//! stops in one of the [`FlowError`] states. Every external call is made
//! exactly once; nothing is retried.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::google::{OAuthProvider, ProviderError, ProviderIdentity};
use super::identity::{Identity, PROVISIONED_SECRET_BYTES};
use super::types::IdentityError;
use crate::models::NewUser;
use crate::notifier::{welcome_body, Notifier, WELCOME_SUBJECT};
use crate::repository::{StoreError, UserStore};

/// The provider call a callback was making when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStep {
    TokenExchange,
    UserInfo,
}

impl fmt::Display for ProviderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStep::TokenExchange => write!(f, "token exchange"),
            ProviderStep::UserInfo => write!(f, "userinfo"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// The token endpoint answered without a usable access token.
    #[error("Failed to get access token")]
    ExchangeFailed,

    /// A provider call failed outright (transport, status or body).
    #[error("provider {step} failed: {source}")]
    UpstreamUnavailable {
        step: ProviderStep,
        source: ProviderError,
    },

    #[error("Provider did not return an email address")]
    MissingEmail,

    #[error("store failure: {0}")]
    StoreFailed(#[from] StoreError),

    #[error("identity failure: {0}")]
    Identity(#[from] IdentityError),
}

impl FlowError {
    fn upstream(step: ProviderStep) -> impl FnOnce(ProviderError) -> FlowError {
        move |source| FlowError::UpstreamUnavailable { step, source }
    }
}

/// Result of a successful callback.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// Where to send the browser; carries the signed token.
    pub redirect_url: String,
    pub email: String,
    /// True when this callback provisioned the account.
    pub created: bool,
}

pub struct OAuthFlow {
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    identity: Identity,
    authorization_url: String,
    client_app_url: String,
}

impl OAuthFlow {
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        identity: Identity,
        authorization_url: String,
        client_app_url: &str,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            identity,
            authorization_url,
            client_app_url: client_app_url.trim_end_matches('/').to_string(),
        }
    }

    /// Consent-screen URL for `GET /auth/google`. No network call.
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    pub async fn handle_callback(&self, code: &str) -> Result<CallbackOutcome, FlowError> {
        let access_token = self
            .provider
            .exchange_code(code)
            .await
            .map_err(FlowError::upstream(ProviderStep::TokenExchange))?
            .ok_or(FlowError::ExchangeFailed)?;
        tracing::debug!("OAuth code exchanged for provider token");

        let profile = self
            .provider
            .fetch_user_info(&access_token)
            .await
            .map_err(FlowError::upstream(ProviderStep::UserInfo))?;
        let email = match profile.email.as_deref() {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => return Err(FlowError::MissingEmail),
        };
        tracing::debug!("OAuth identity fetched for {}", email);

        let created = self.resolve_account(&email, &profile).await?;

        let token = self.identity.sign(&email)?;
        tracing::info!("OAuth login succeeded for {}", email);

        Ok(CallbackOutcome {
            redirect_url: format!(
                "{}/dashboard?token={}",
                self.client_app_url,
                urlencoding::encode(&token)
            ),
            email,
            created,
        })
    }

    /// Find the account by email, provisioning it if absent.
    ///
    /// Existing records are reused untouched, even when their name or
    /// external id differ from the provider profile.
    async fn resolve_account(
        &self,
        email: &str,
        profile: &ProviderIdentity,
    ) -> Result<bool, FlowError> {
        if self.store.find_by_email(email).await?.is_some() {
            tracing::debug!("Existing account found for {}", email);
            return Ok(false);
        }

        let secret = self.identity.random_secret(PROVISIONED_SECRET_BYTES);
        let digest = self.identity.hash(&secret).await?;

        let id = self
            .store
            .insert(NewUser {
                email: email.to_string(),
                password_digest: digest,
                display_name: profile.name.clone(),
                external_id: profile.subject.clone(),
            })
            .await?;
        tracing::info!("Provisioned account {} for {}", id, email);

        let body = welcome_body(profile.name.as_deref(), email, &secret);
        if !self.notifier.send(email, WELCOME_SUBJECT, &body).await {
            tracing::warn!("Welcome email to {} was not delivered", email);
        }

        Ok(true)
    }
}
