//! Authentication module providing account management and the credential
//! lifecycle.
//!
//! This module implements secure credential handling with:
//! - Argon2id password hashing with per-call random salts
//! - Legacy digest verification for accounts migrated from the predecessor
//!   system
//! - Rate-limited login with temporary account lockout
//! - Single-use, time-boxed password-reset tokens
//!
//! Storage is injected behind the [`crate::db::DocumentCollection`] trait,
//! so the manager runs unchanged against the document database or the
//! JSON-file fallback.
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
//!     let manager = UserManager::new(db.users(), SecurityPolicy::from_env());
//!
//!     manager
//!         .create_user("alice", "Str0ng!Pass", "alice@example.com", "Alice A", Role::Teacher)
//!         .await?;
//!     let session = manager.authenticate("alice", Some("Str0ng!Pass")).await?;
//!     println!("logged in as {} ({:?})", session.username, session.role);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod tokens;

pub use errors::{AuthError, AuthResult};
pub use manager::{SecurityPolicy, UserManager};
pub use models::{AccountStatus, IssuedReset, Role, SessionInfo, User, UserSummary};
