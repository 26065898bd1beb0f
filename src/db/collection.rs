//! Document-collection trait for testability and dependency injection.
//!
//! The credential core talks to storage exclusively through
//! [`DocumentCollection`], so the document database and the JSON-file
//! fallback are interchangeable and tests can run against either backend.

use async_trait::async_trait;
use mongodb::bson;
use thiserror::Error;

use super::filter::{Filter, Update};

/// Storage errors shared by both backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document database driver error
    #[error("Document database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// File-backend I/O error
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be serialized or deserialized
    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filter or update could not be represented as a database query
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] bson::ser::Error),

    /// Insert violated a unique key
    #[error("Duplicate value for unique key: {0}")]
    DuplicateKey(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts reported by a single-document update.
///
/// An upserted insert reports zero for both counts; callers that need to
/// distinguish a conditional no-op from a hit inspect `matched`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOutcome {
    /// Documents the filter matched (0 or 1).
    pub matched: u64,

    /// Documents actually changed by the update.
    pub modified: u64,
}

/// Minimal document-collection contract required by the credential core.
///
/// Filters support equality and field-existence predicates; updates are
/// `$set` maps. Semantics follow the document database: `update_one` applies
/// to the first match only, an empty filter addresses every document.
#[async_trait]
pub trait DocumentCollection<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Find the first document matching the filter.
    async fn find_one(&self, filter: Filter) -> StoreResult<Option<T>>;

    /// Find all documents matching the filter.
    async fn find(&self, filter: Filter) -> StoreResult<Vec<T>>;

    /// Insert a single document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] when the document collides with
    /// an existing value on one of the collection's unique keys.
    async fn insert_one(&self, document: &T) -> StoreResult<()>;

    /// Apply the update to the first matching document. With `upsert`, a
    /// missing match inserts a document seeded from the filter's equality
    /// clauses plus the update's `$set` fields.
    async fn update_one(
        &self,
        filter: Filter,
        update: Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome>;

    /// Apply the update to every matching document, returning the number of
    /// documents changed.
    async fn update_many(&self, filter: Filter, update: Update) -> StoreResult<u64>;

    /// Delete every matching document, returning the number removed.
    async fn delete_many(&self, filter: Filter) -> StoreResult<u64>;

    /// Count matching documents.
    async fn count_documents(&self, filter: Filter) -> StoreResult<u64>;
}
