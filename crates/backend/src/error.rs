//! Unified error handling for the backend API.
//!
//! Every error renders as `{"detail": "..."}` so clients see one shape
//! regardless of which layer failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared_types::ErrorDetail;
use thiserror::Error;

use crate::auth::{FlowError, IdentityError, ProviderStep};
use crate::repository::StoreError;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected input: duplicate email, bad credentials
    #[error("{0}")]
    Validation(String),

    /// Malformed request field
    #[error("{0}")]
    UnprocessableEntity(String),

    /// OAuth provider failure; the store was not touched
    #[error("{0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        let message = err.to_string();
        match err {
            FlowError::ExchangeFailed | FlowError::MissingEmail => ApiError::Upstream(message),
            FlowError::UpstreamUnavailable { step, source } => {
                tracing::warn!("OAuth {} call failed: {}", step, source);
                ApiError::Upstream(provider_failure_detail(step).to_string())
            }
            FlowError::StoreFailed(e) => ApiError::Store(e),
            FlowError::Identity(e) => e.into(),
        }
    }
}

/// Detail shown when a provider call fails outright.
fn provider_failure_detail(step: ProviderStep) -> &'static str {
    match step {
        ProviderStep::TokenExchange => "Failed to get access token",
        ProviderStep::UserInfo => "Failed to get user info",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorDetail::new(detail))).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
