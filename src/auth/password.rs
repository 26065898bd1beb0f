//! Password hashing and verification.
//!
//! Current digests are Argon2id PHC strings with a per-call random salt, so
//! no salt material lives outside the digest itself. Accounts migrated from
//! the predecessor system may still carry werkzeug-style
//! `pbkdf2:sha256:<rounds>$<salt>$<hex>` digests; verification detects the
//! digest's self-described format and dispatches to the matching
//! comparator. A digest in an unrecognized or malformed format verifies as
//! false rather than erroring.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use hmac::Hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Rounds assumed for legacy digests whose method segment omits the count.
const DEFAULT_LEGACY_ROUNDS: u32 = 260_000;

/// A password digest tagged with its format.
#[derive(Debug, PartialEq, Eq)]
enum Digest<'a> {
    /// Argon2 PHC string, the current format.
    Argon2(&'a str),

    /// Werkzeug-style PBKDF2-HMAC-SHA256 digest from the system this one
    /// replaced.
    LegacyPbkdf2 {
        rounds: u32,
        salt: &'a str,
        key: Vec<u8>,
    },
}

fn parse_digest(digest: &str) -> Option<Digest<'_>> {
    if digest.starts_with("$argon2") {
        return Some(Digest::Argon2(digest));
    }

    // pbkdf2:sha256:600000$<salt>$<hex key>
    let rest = digest.strip_prefix("pbkdf2:")?;
    let (method, rest) = rest.split_once('$')?;
    let (salt, key_hex) = rest.split_once('$')?;

    let mut method_parts = method.split(':');
    if method_parts.next()? != "sha256" {
        return None;
    }
    let rounds = match method_parts.next() {
        Some(rounds) => rounds.parse().ok()?,
        None => DEFAULT_LEGACY_ROUNDS,
    };

    let key = hex::decode(key_hex).ok()?;
    if salt.is_empty() || key.is_empty() {
        return None;
    }

    Some(Digest::LegacyPbkdf2 { rounds, salt, key })
}

/// Hash a password into the current digest format.
///
/// # Errors
///
/// Returns [`AuthError::HashingFailed`] if the hasher rejects its inputs.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against a stored digest of either supported format.
///
/// Never errors: unparsable digests and comparator failures all report a
/// plain mismatch so a corrupt record reads as a wrong password, not a
/// server fault.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match parse_digest(digest) {
        Some(Digest::Argon2(phc)) => PasswordHash::new(phc).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        }),
        Some(Digest::LegacyPbkdf2 { rounds, salt, key }) => {
            let mut derived = vec![0u8; key.len()];
            pbkdf2::pbkdf2::<Hmac<Sha256>>(
                password.as_bytes(),
                salt.as_bytes(),
                rounds,
                &mut derived,
            );
            derived.ct_eq(&key).into()
        }
        None => false,
    }
}
