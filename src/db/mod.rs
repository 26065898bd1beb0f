//! Storage module providing the document-store abstraction and its two
//! backends.
//!
//! The application stores everything as documents in named collections. A
//! managed document database is preferred; when it cannot be reached at
//! startup the store transparently falls back to JSON files on local disk
//! with identical query semantics. Consumers receive collection handles
//! behind the [`DocumentCollection`] trait and never observe which backend
//! was selected.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use serde_json::Value;

pub mod collection;
pub mod config;
pub mod filter;
pub mod json;
pub mod mongo;

pub use collection::{DocumentCollection, StoreError, StoreResult, UpdateOutcome};
pub use config::StoreConfig;
pub use filter::{Filter, Predicate, Update};
pub use json::JsonCollection;
pub use mongo::MongoCollection;

use crate::auth::models::User;

/// Which backend a [`Database`] ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Managed document database.
    Mongo,

    /// JSON files on local disk.
    JsonFile,
}

/// Explicitly constructed store handle holding the application's named
/// collections. Built once at process start and passed into consumers.
pub struct Database {
    backend: BackendKind,
    users: Arc<dyn DocumentCollection<User>>,
    students: Arc<dyn DocumentCollection<Value>>,
    attendance: Arc<dyn DocumentCollection<Value>>,
    sessions: Arc<dyn DocumentCollection<Value>>,
    links: Arc<dyn DocumentCollection<Value>>,
}

impl Database {
    /// Connect to the configured store.
    ///
    /// Probes the document database when configured (short server-selection
    /// timeout plus a ping) and ensures its indexes; any probe failure logs
    /// a warning and selects the JSON-file backend instead.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        if let (Some(uri), Some(db_name)) = (config.mongo_uri.as_deref(), config.mongo_db.as_deref())
        {
            match Self::connect_mongo(uri, db_name, config.selection_timeout_ms).await {
                Ok(database) => {
                    log::info!("connected to document database `{db_name}`");
                    return Ok(database);
                }
                Err(err) => {
                    log::warn!(
                        "document database unavailable ({err}); using JSON file store at {}",
                        config.data_dir.display()
                    );
                }
            }
        }
        Self::open_json(&config.data_dir)
    }

    async fn connect_mongo(uri: &str, db_name: &str, timeout_ms: u64) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(Duration::from_millis(timeout_ms));
        let client = Client::with_options(options)?;
        let db = client.database(db_name);

        // Connectivity probe; fails fast under the selection timeout.
        db.run_command(doc! { "ping": 1 }).await?;
        mongo::ensure_indexes(&db).await?;

        Ok(Self {
            backend: BackendKind::Mongo,
            users: Arc::new(MongoCollection::new(db.collection::<User>("users"))),
            students: Arc::new(MongoCollection::new(db.collection::<Value>("students"))),
            attendance: Arc::new(MongoCollection::new(db.collection::<Value>("attendance"))),
            sessions: Arc::new(MongoCollection::new(
                db.collection::<Value>("attendance_sessions"),
            )),
            links: Arc::new(MongoCollection::new(
                db.collection::<Value>("attendance_links"),
            )),
        })
    }

    fn open_json(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            backend: BackendKind::JsonFile,
            users: Arc::new(
                JsonCollection::new(data_dir.join("users.json"))
                    .with_unique_keys(&["username", "user_id", "email"]),
            ),
            students: Arc::new(JsonCollection::new(data_dir.join("students.json"))),
            attendance: Arc::new(JsonCollection::new(data_dir.join("attendance.json"))),
            sessions: Arc::new(
                JsonCollection::new(data_dir.join("sessions.json")).with_ttl("expires_at"),
            ),
            links: Arc::new(JsonCollection::new(data_dir.join("links.json")).with_ttl("expires_at")),
        })
    }

    /// Backend selected at connect time.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// User accounts collection.
    pub fn users(&self) -> Arc<dyn DocumentCollection<User>> {
        Arc::clone(&self.users)
    }

    /// Registered students, scoped per owning teacher.
    pub fn students(&self) -> Arc<dyn DocumentCollection<Value>> {
        Arc::clone(&self.students)
    }

    /// Attendance records.
    pub fn attendance(&self) -> Arc<dyn DocumentCollection<Value>> {
        Arc::clone(&self.attendance)
    }

    /// Scan sessions; expire via `expires_at`.
    pub fn sessions(&self) -> Arc<dyn DocumentCollection<Value>> {
        Arc::clone(&self.sessions)
    }

    /// Shareable attendance links; expire via `expires_at`.
    pub fn links(&self) -> Arc<dyn DocumentCollection<Value>> {
        Arc::clone(&self.links)
    }
}
