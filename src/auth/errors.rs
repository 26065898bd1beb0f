//! Authentication error types.
//!
//! Every public credential operation resolves to either a payload or one of
//! these reasons; none of them panic or surface backend faults directly.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::StoreError;

/// Authentication and credential-lifecycle errors.
///
/// Credential failures are deliberately information-minimal: nothing here
/// discloses whether the username or the password was the wrong half.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Storage failure during a read or write
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Secure token generation failed
    #[error("Secure token generation failed")]
    TokenGeneration,

    /// No account with that username
    #[error("User not found")]
    UserNotFound,

    /// Account is temporarily locked; the instant names when it reopens
    #[error("Account locked until {0}")]
    AccountLocked(DateTime<Utc>),

    /// Account exists but is not active
    #[error("Account is inactive")]
    AccountInactive,

    /// Password verification failed
    #[error("Invalid password")]
    InvalidPassword,

    /// Username shorter than the minimum
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    /// Email address does not look like one
    #[error("Invalid email format")]
    InvalidEmail,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,

    /// Password failed the strength rules
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// No account registered under that email
    #[error("Email not found")]
    EmailNotFound,

    /// Reset attempted without a token
    #[error("No reset token provided")]
    MissingResetToken,

    /// No account currently holds that reset token
    #[error("Invalid reset token")]
    InvalidResetToken,

    /// Reset token exists but its expiry has passed
    #[error("Reset token has expired")]
    ResetTokenExpired,
}

impl AuthError {
    /// Client-safe reason string.
    ///
    /// Storage errors are collapsed to a generic message so callers never
    /// leak backend details; every other variant is already phrased for end
    /// users.
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
