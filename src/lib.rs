//! # ClassTrack Core
//!
//! Authentication and credential core for the ClassTrack attendance system:
//! account management, rate-limited login with temporary lockout, password
//! changes, and an email-based password-reset token flow, all layered on a
//! document-store abstraction.
//!
//! ## Architecture
//!
//! - [`db`]: the document-store contract ([`db::DocumentCollection`]) with
//!   two interchangeable backends — a managed document database and a
//!   JSON-file fallback selected at startup by a connectivity probe.
//! - [`auth`]: the credential core ([`auth::UserManager`]), password
//!   hashing with legacy-format verification, and secure token generation.
//! - [`mailer`]: the SMTP collaborator that delivers reset tokens.
//!
//! The presentation layer (pages, QR scanning, import/export) lives in the
//! application crate and calls into [`auth::UserManager`]; nothing here
//! holds process-global state.
//!
//! ## Example
//!
//! ```no_run
//! use classtrack::auth::{Role, SecurityPolicy, UserManager};
//! use classtrack::db::{Database, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&StoreConfig::from_env()).await?;
//!     let users = UserManager::new(db.users(), SecurityPolicy::from_env());
//!
//!     users
//!         .create_user("alice", "Str0ng!Pass", "alice@example.com", "Alice A", Role::Teacher)
//!         .await?;
//!     Ok(())
//! }
//! ```

/// Credential core: accounts, authentication, reset tokens.
pub mod auth;
pub use auth::{AuthError, AuthResult, Role, SecurityPolicy, SessionInfo, User, UserManager};

/// Document-store abstraction and backends.
pub mod db;
pub use db::{BackendKind, Database, DocumentCollection, Filter, StoreConfig, Update};

/// Outbound email for reset-token delivery.
pub mod mailer;
pub use mailer::{MailerConfig, ResetMailer, SmtpMailer};
