use axum::http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod db;
pub mod error;
mod models;
mod notifier;
pub mod repository;
mod routes;
mod schema;
#[cfg(test)]
mod testing;

use auth::google::{self, GoogleOAuthClient};
use auth::{Identity, OAuthFlow};
use config::AppConfig;
use notifier::{DisabledNotifier, Notifier, SmtpNotifier};
use repository::{PgUserStore, UserStore};

/// Shared handler state. Built once in `main`; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub identity: Identity,
    pub oauth: Arc<OAuthFlow>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Loaded configuration: {:?}", config);

    if config.google.http_timeout.is_none() {
        tracing::warn!("OAUTH_HTTP_TIMEOUT_SECS not set, provider calls have no timeout");
    }

    let pool = db::establish_connection_pool(&config.database)?;
    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));

    let notifier: Arc<dyn Notifier> = match &config.mail {
        Some(mail) => {
            tracing::info!("Sending mail via {}:{}", mail.server, mail.port);
            Arc::new(SmtpNotifier::new(mail)?)
        }
        None => {
            tracing::warn!("MAIL_SERVER not set, welcome emails are disabled");
            Arc::new(DisabledNotifier)
        }
    };

    let identity = Identity::new(config.auth.clone());
    let provider = Arc::new(GoogleOAuthClient::new(&config.google)?);
    let oauth = OAuthFlow::new(
        provider,
        store.clone(),
        notifier,
        identity.clone(),
        google::authorization_url(&config.google),
        &config.client_app_url,
    );

    let state = AppState {
        store,
        identity,
        oauth: Arc::new(oauth),
    };

    let app = routes::build_router(state).layer(build_cors_layer(
        config.cors_allowed_origins.as_deref(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build CORS layer from `CORS_ALLOWED_ORIGINS`.
///
/// If not set, defaults to permissive CORS (for development only).
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                    .allow_credentials(true)
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
