//! User manager implementation.
//!
//! The behavioral core of the credential subsystem: account creation,
//! rate-limited authentication with temporary lockout, password change, and
//! the reset-token lifecycle. Stateless between calls; every operation is a
//! read followed by at most one write through the injected store handle.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use super::errors::{AuthError, AuthResult};
use super::models::{AccountStatus, IssuedReset, Role, SessionInfo, User, UserSummary};
use super::{password, tokens};
use crate::db::{DocumentCollection, Filter, Update};

/// Symbols a password may contain; at least one is required.
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Conventional address shape: local part, `@`, domain, dot, ≥2-char TLD.
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

/// Reset tokens carry 32 bytes of entropy (43 URL-safe characters).
const RESET_TOKEN_BYTES: usize = 32;

/// Tunable credential-security limits.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    /// Consecutive failed logins before the account locks.
    pub max_login_attempts: u32,

    /// How long a lockout lasts once triggered.
    pub lockout_duration: Duration,

    /// Reset-token lifetime.
    pub token_expiry: Duration,

    /// Minimum password length.
    pub password_min_length: usize,
}

impl SecurityPolicy {
    /// Load limits from the environment, falling back to the defaults.
    ///
    /// - `MAX_LOGIN_ATTEMPTS` (default 5)
    /// - `LOCKOUT_DURATION_MINUTES` (default 30)
    /// - `TOKEN_EXPIRY_MINUTES` (default 30)
    /// - `PASSWORD_MIN_LENGTH` (default 8)
    pub fn from_env() -> Self {
        let minutes = |name: &str, default: i64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            max_login_attempts: std::env::var("MAX_LOGIN_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            lockout_duration: Duration::minutes(minutes("LOCKOUT_DURATION_MINUTES", 30)),
            token_expiry: Duration::minutes(minutes("TOKEN_EXPIRY_MINUTES", 30)),
            password_min_length: std::env::var("PASSWORD_MIN_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration: Duration::minutes(30),
            token_expiry: Duration::minutes(30),
            password_min_length: 8,
        }
    }
}

/// User account manager.
///
/// Owns no state beyond the injected users collection and the policy; safe
/// to share across request handlers.
pub struct UserManager {
    users: Arc<dyn DocumentCollection<User>>,
    policy: SecurityPolicy,
    email_pattern: Regex,
}

impl UserManager {
    pub fn new(users: Arc<dyn DocumentCollection<User>>, policy: SecurityPolicy) -> Self {
        Self {
            users,
            policy,
            email_pattern: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
        }
    }

    /// Create a new user account.
    ///
    /// Validation short-circuits in a fixed order: username length, email
    /// format, username uniqueness, email uniqueness, password strength.
    /// Nothing is written unless every check passes; the created account is
    /// active immediately (no verification step).
    ///
    /// # Errors
    ///
    /// * [`AuthError::UsernameTooShort`] — username absent or under 3 chars
    /// * [`AuthError::InvalidEmail`] — address fails the format check
    /// * [`AuthError::UsernameTaken`] / [`AuthError::EmailTaken`]
    /// * [`AuthError::WeakPassword`] — strength rules not met
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
        role: Role,
    ) -> AuthResult<User> {
        if username.chars().count() < 3 {
            return Err(AuthError::UsernameTooShort);
        }
        if !self.email_pattern.is_match(email) {
            return Err(AuthError::InvalidEmail);
        }
        if self
            .users
            .find_one(Filter::new().eq("username", username))
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }
        if self
            .users
            .find_one(Filter::new().eq("email", email))
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }
        self.validate_password(password)?;

        let user = User {
            user_id: tokens::new_user_id(),
            username: username.to_string(),
            password: password::hash_password(password)?,
            email: Some(email.to_string()),
            name: name.to_string(),
            role,
            created_at: Utc::now(),
            last_login: None,
            last_modified: None,
            failed_attempts: 0,
            is_locked: false,
            lockout_until: None,
            status: AccountStatus::Active,
            reset_token: None,
            token_expiry: None,
        };
        self.users.insert_one(&user).await?;
        Ok(user)
    }

    /// Authenticate a user.
    ///
    /// `password: None` is the session-refresh path: it re-validates an
    /// already-established login and returns current display attributes
    /// without touching attempt counters or timestamps.
    ///
    /// An expired lockout is lifted (and persisted) before the password is
    /// evaluated. A wrong password increments the attempt counter through a
    /// conditional write pinned to the counter value this call read, so
    /// racing attempts cannot compound a lockout.
    pub async fn authenticate(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> AuthResult<SessionInfo> {
        let mut user = self
            .users
            .find_one(Filter::new().eq("username", username))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_locked {
            match user.lockout_until {
                Some(until) if until > Utc::now() => {
                    return Err(AuthError::AccountLocked(until));
                }
                _ => {
                    self.users
                        .update_one(
                            Filter::new().eq("username", username),
                            unlock_update(),
                            false,
                        )
                        .await?;
                    user.is_locked = false;
                    user.failed_attempts = 0;
                    user.lockout_until = None;
                }
            }
        }

        if user.status != AccountStatus::Active {
            return Err(AuthError::AccountInactive);
        }

        let Some(password) = password else {
            return Ok(SessionInfo::from(&user));
        };

        if password::verify_password(password, &user.password) {
            self.users
                .update_one(
                    Filter::new().eq("username", username),
                    unlock_update().set("last_login", Utc::now()),
                    false,
                )
                .await?;
            return Ok(SessionInfo::from(&user));
        }

        let failed_attempts = user.failed_attempts + 1;
        let lockout_until = (failed_attempts >= self.policy.max_login_attempts)
            .then(|| Utc::now() + self.policy.lockout_duration);

        self.users
            .update_one(
                Filter::new()
                    .eq("username", username)
                    .eq("failed_attempts", user.failed_attempts),
                Update::new()
                    .set("failed_attempts", failed_attempts)
                    .set("is_locked", lockout_until.is_some())
                    .set("lockout_until", lockout_until),
                false,
            )
            .await?;

        match lockout_until {
            Some(until) => Err(AuthError::AccountLocked(until)),
            None => Err(AuthError::InvalidPassword),
        }
    }

    /// Change a password after re-proving the current one.
    ///
    /// Runs a full [`authenticate`](Self::authenticate) first, so lockout
    /// and inactive-account rules apply and a wrong current password counts
    /// as a failed login attempt.
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        self.authenticate(username, Some(current_password)).await?;
        self.validate_password(new_password)?;

        self.users
            .update_one(
                Filter::new().eq("username", username),
                Update::new()
                    .set("password", password::hash_password(new_password)?)
                    .set("last_modified", Utc::now()),
                false,
            )
            .await?;
        Ok(())
    }

    /// Look up an account by registered email address.
    pub async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .find_one(Filter::new().eq("email", email))
            .await?)
    }

    /// Issue a password-reset token for the account registered under
    /// `email`.
    ///
    /// Overwrites any previously issued token, so at most one token is live
    /// per account. Returns the raw token and the display name to address
    /// the notification to; delivering the token is the mailer
    /// collaborator's job. Callers facing end users should report a generic
    /// outcome regardless of this result to avoid account enumeration.
    pub async fn issue_reset_token(&self, email: &str) -> AuthResult<IssuedReset> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let token = tokens::new_secure_token(RESET_TOKEN_BYTES)?;
        let expiry = Utc::now() + self.policy.token_expiry;
        self.users
            .update_one(
                Filter::new().eq("email", email),
                Update::new()
                    .set("reset_token", token.as_str())
                    .set("token_expiry", expiry),
                false,
            )
            .await?;

        let display_name = if user.name.is_empty() {
            user.username.clone()
        } else {
            user.name.clone()
        };
        Ok(IssuedReset {
            token,
            display_name,
        })
    }

    /// Check whether a reset token is currently valid.
    ///
    /// Pure read: never mutates state, safe to call repeatedly (the reset
    /// form calls it once to render and again on submission).
    pub async fn validate_reset_token(&self, token: &str) -> AuthResult<UserSummary> {
        if token.is_empty() {
            return Err(AuthError::MissingResetToken);
        }
        let user = self
            .users
            .find_one(Filter::new().eq("reset_token", token))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        match user.token_expiry {
            Some(expiry) if expiry > Utc::now() => Ok(UserSummary {
                username: user.username,
                email: user.email,
                name: user.name,
            }),
            _ => Err(AuthError::ResetTokenExpired),
        }
    }

    /// Consume a reset token and set a new password.
    ///
    /// Strength is validated before the token, matching creation and change
    /// semantics. One write overwrites the digest, clears the token pair,
    /// and clears any lockout state: proving control of the registered
    /// email outranks an outstanding lockout.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        self.validate_password(new_password)?;
        self.validate_reset_token(token).await?;

        self.users
            .update_one(
                Filter::new().eq("reset_token", token),
                unlock_update()
                    .set("password", password::hash_password(new_password)?)
                    .set("reset_token", None::<String>)
                    .set("token_expiry", None::<DateTime<Utc>>)
                    .set("last_modified", Utc::now()),
                false,
            )
            .await?;
        Ok(())
    }

    /// Null out every expired reset-token pair.
    ///
    /// Best-effort maintenance invoked by an external scheduler; failures
    /// are logged and swallowed since an expired token is already rejected
    /// at validation. Returns how many accounts were swept.
    pub async fn clear_expired_tokens(&self) -> u64 {
        match self.sweep_expired_tokens().await {
            Ok(cleared) => {
                if cleared > 0 {
                    log::debug!("cleared {cleared} expired reset tokens");
                }
                cleared
            }
            Err(err) => {
                log::debug!("expired-token sweep skipped: {err}");
                0
            }
        }
    }

    async fn sweep_expired_tokens(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let holders = self
            .users
            .find(Filter::new().exists("token_expiry", true))
            .await?;

        let mut cleared = 0;
        for user in holders {
            if user.token_expiry.is_some_and(|expiry| expiry <= now) {
                let outcome = self
                    .users
                    .update_one(
                        Filter::new().eq("user_id", user.user_id.as_str()),
                        Update::new()
                            .set("reset_token", None::<String>)
                            .set("token_expiry", None::<DateTime<Utc>>),
                        false,
                    )
                    .await?;
                cleared += outcome.modified;
            }
        }
        Ok(cleared)
    }

    fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::WeakPassword("Password cannot be empty".to_string()));
        }
        if password.chars().count() < self.policy.password_min_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.policy.password_min_length
            )));
        }

        let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
        let allowed_charset = password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));

        if !(has_lowercase && has_uppercase && has_digit && has_symbol && allowed_charset) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one uppercase letter, one lowercase \
                 letter, one number, and one special character (@$!%*?&)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// `$set` fields that return an account to the unlocked state.
fn unlock_update() -> Update {
    Update::new()
        .set("is_locked", false)
        .set("failed_attempts", 0u32)
        .set("lockout_until", None::<DateTime<Utc>>)
}
