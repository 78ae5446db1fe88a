//! JWT token creation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use super::types::Claims;
use crate::config::AuthConfig;

/// Create a new JWT token whose subject is `email`.
pub fn create_token(
    config: &AuthConfig,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::minutes(config.token_duration_minutes);

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate a JWT token and return claims. Nothing in the service consumes
/// tokens yet, so this only backs the tests.
#[cfg(test)]
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
