//! Authentication HTTP handlers.

use axum::extract::Query;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared_types::{LoginRequest, LoginResponse, SignupRequest, SignupResponse, Validate};

use crate::error::{ApiError, ApiResult};
use crate::models::NewUser;
use crate::repository::StoreError;
use crate::AppState;

/// Field checks on a request body. Email syntax is the only rule.
fn check_body(payload: &impl Validate) -> ApiResult<()> {
    payload.validate().map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::UnprocessableEntity("Invalid email address".to_string())
    })
}

/// Register a local account.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    check_body(&payload)?;

    if state.store.find_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }

    let digest = state.identity.hash(&payload.password).await?;
    let id = match state
        .store
        .insert(NewUser::local(payload.email.as_str(), digest))
        .await
    {
        Ok(id) => id,
        // Lost a race with a concurrent signup for the same address
        Err(StoreError::DuplicateEmail) => {
            return Err(ApiError::validation("Email already registered"))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Created user {} for {}", id, payload.email);
    Ok(Json(SignupResponse::created(id)))
}

/// Password login. Unknown email and wrong password get the same answer.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    check_body(&payload)?;

    let user = state.store.find_by_email(&payload.email).await?;
    let verified = match &user {
        Some(user) => {
            state
                .identity
                .verify(&payload.password, &user.password_digest)
                .await?
        }
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!("Rejected login for {}", payload.email);
        return Err(ApiError::validation("Invalid credentials"));
    };

    let token = state.identity.sign(&user.email)?;
    Ok(Json(LoginResponse::success(token)))
}

/// Start Google OAuth login flow by redirecting to the consent screen.
pub async fn google_login(State(state): State<AppState>) -> Response {
    found(state.oauth.authorization_url())
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackParams {
    pub code: String,
}

/// Handle Google OAuth callback.
///
/// On success the browser is redirected to the client application with the
/// signed token in the query string.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<GoogleCallbackParams>,
) -> ApiResult<Response> {
    let outcome = state.oauth.handle_callback(&params.code).await?;
    if outcome.created {
        tracing::info!("First Google login for {}", outcome.email);
    }
    Ok(found(&outcome.redirect_url))
}

/// 302 Found with a `Location` header.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
