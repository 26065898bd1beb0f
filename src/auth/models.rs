//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Teacher,
}

/// Account status. Accounts are created active; deactivation is an
/// administrative action performed directly against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// User account document. One per account; `user_id` and `username` are
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier, stable across renames of other fields.
    pub user_id: String,

    /// Unique login name, at least 3 characters.
    pub username: String,

    /// Tagged password digest. Never the raw secret.
    pub password: String,

    /// Unique when present.
    #[serde(default)]
    pub email: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: String,

    pub role: Role,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Consecutive failed logins since the last successful one.
    #[serde(default)]
    pub failed_attempts: u32,

    #[serde(default)]
    pub is_locked: bool,

    /// Lockout expiry; meaningful only while `is_locked`.
    #[serde(default)]
    pub lockout_until: Option<DateTime<Utc>>,

    pub status: AccountStatus,

    /// Outstanding password-reset token; at most one per account, always
    /// set and cleared together with `token_expiry`.
    #[serde(default)]
    pub reset_token: Option<String>,

    #[serde(default)]
    pub token_expiry: Option<DateTime<Utc>>,
}

/// Display attributes returned by a successful authentication, cached by
/// the presentation layer for the lifetime of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
}

impl From<&User> for SessionInfo {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The holder of a reset token, as reported by token validation.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub email: Option<String>,
    pub name: String,
}

/// A freshly issued reset token plus the display name to address the
/// outbound notification to.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    /// Raw URL-safe token; embedded in the reset link, never stored by the
    /// caller.
    pub token: String,

    /// User's name, falling back to the username.
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_and_status_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
        assert_eq!(serde_json::to_value(Role::Teacher).unwrap(), json!("teacher"));
        assert_eq!(
            serde_json::to_value(AccountStatus::Active).unwrap(),
            json!("active")
        );
    }

    #[test]
    fn user_round_trips_through_json() {
        let user = User {
            user_id: "4a1e3c1a-0000-4000-8000-000000000000".to_string(),
            username: "alice".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            email: Some("alice@example.com".to_string()),
            name: "Alice A".to_string(),
            role: Role::Teacher,
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

        let value = serde_json::to_value(&user).unwrap();
        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back.username, "alice");
        assert_eq!(back.role, Role::Teacher);
        assert_eq!(back.status, AccountStatus::Active);
        assert!(back.reset_token.is_none());
    }

    #[test]
    fn documents_without_optional_fields_deserialize() {
        // Documents written before the lockout and reset fields existed.
        let legacy = json!({
            "user_id": "u-1",
            "username": "bob",
            "password": "pbkdf2:sha256:600000$salt$00",
            "role": "admin",
            "created_at": "2023-05-01T10:00:00Z",
            "status": "active"
        });

        let user: User = serde_json::from_value(legacy).unwrap();
        assert_eq!(user.failed_attempts, 0);
        assert!(!user.is_locked);
        assert!(user.email.is_none());
        assert!(user.token_expiry.is_none());
        assert_eq!(user.name, "");
    }
}
