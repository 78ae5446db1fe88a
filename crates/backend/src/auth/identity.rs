//! Hashing, verification, signing and secret generation behind one handle.

use super::types::IdentityError;
use super::{jwt, password};
use crate::config::AuthConfig;

/// Minimum raw entropy for a provisioned password.
pub const PROVISIONED_SECRET_BYTES: usize = 16;

#[derive(Clone)]
pub struct Identity {
    config: AuthConfig,
}

impl Identity {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[cfg(test)]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// bcrypt runs on the blocking pool so it does not stall the runtime.
    pub async fn hash(&self, plaintext: &str) -> Result<String, IdentityError> {
        let plaintext = plaintext.to_string();
        let cost = self.config.bcrypt_cost;
        let digest =
            tokio::task::spawn_blocking(move || password::hash_password(&plaintext, cost))
                .await??;
        Ok(digest)
    }

    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, IdentityError> {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        let matches =
            tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &digest))
                .await?;
        Ok(matches)
    }

    /// Sign a bearer token for `email`.
    pub fn sign(&self, email: &str) -> Result<String, IdentityError> {
        Ok(jwt::create_token(&self.config, email)?)
    }

    pub fn random_secret(&self, byte_len: usize) -> String {
        password::random_secret(byte_len)
    }
}
