//! Password digests and provisioned secrets.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Hash a password with bcrypt at the given cost. Each call uses a fresh salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Check a password against a stored digest.
///
/// A digest that cannot be parsed counts as a mismatch.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match bcrypt::verify(password, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password digest is unreadable: {}", e);
            false
        }
    }
}

/// `byte_len` random bytes from the OS RNG, URL-safe base64 without padding.
pub fn random_secret(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
