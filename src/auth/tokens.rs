//! Secure identifier and token generation.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};

/// Generate an opaque user identifier: 128 random bits, collision-resistant
/// and non-sequential.
pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate `byte_len` bytes from the operating system's CSPRNG, encoded
/// URL-safe without padding so the result can sit in a hyperlink query
/// string without further escaping.
///
/// # Errors
///
/// Returns [`AuthError::TokenGeneration`] when the OS entropy source is
/// unavailable.
pub fn new_secure_token(byte_len: usize) -> AuthResult<String> {
    let mut bytes = vec![0u8; byte_len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::TokenGeneration)?;
    Ok(URL_SAFE_NO_PAD.encode(&bytes))
}
