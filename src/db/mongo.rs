//! Managed document-database backend.
//!
//! Thin adapter from [`DocumentCollection`] onto `mongodb::Collection`,
//! plus the index bootstrap the application relies on for uniqueness and
//! session/link expiry.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::collection::{DocumentCollection, StoreError, StoreResult, UpdateOutcome};
use super::filter::{Filter, Update};

/// Document-database collection handle.
pub struct MongoCollection<T>
where
    T: Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Send + Sync,
{
    pub fn new(inner: Collection<T>) -> Self {
        Self { inner }
    }
}

fn map_write_error(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = &*err.kind {
        // 11000: unique index violation
        if write_error.code == 11000 {
            return StoreError::DuplicateKey(write_error.message.clone());
        }
    }
    StoreError::Mongo(err)
}

#[async_trait]
impl<T> DocumentCollection<T> for MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn find_one(&self, filter: Filter) -> StoreResult<Option<T>> {
        Ok(self.inner.find_one(filter.to_document()?).await?)
    }

    async fn find(&self, filter: Filter) -> StoreResult<Vec<T>> {
        let cursor = self.inner.find(filter.to_document()?).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(&self, document: &T) -> StoreResult<()> {
        self.inner
            .insert_one(document)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn update_one(
        &self,
        filter: Filter,
        update: Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .inner
            .update_one(filter.to_document()?, update.to_document()?)
            .upsert(upsert)
            .await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn update_many(&self, filter: Filter, update: Update) -> StoreResult<u64> {
        let result = self
            .inner
            .update_many(filter.to_document()?, update.to_document()?)
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_many(&self, filter: Filter) -> StoreResult<u64> {
        let result = self.inner.delete_many(filter.to_document()?).await?;
        Ok(result.deleted_count)
    }

    async fn count_documents(&self, filter: Filter) -> StoreResult<u64> {
        Ok(self.inner.count_documents(filter.to_document()?).await?)
    }
}

fn unique() -> IndexOptions {
    IndexOptions::builder().unique(true).build()
}

fn unique_sparse() -> IndexOptions {
    IndexOptions::builder().unique(true).sparse(true).build()
}

fn ttl_now() -> IndexOptions {
    IndexOptions::builder()
        .expire_after(Duration::from_secs(0))
        .build()
}

fn index(keys: mongodb::bson::Document, options: Option<IndexOptions>) -> IndexModel {
    let builder = IndexModel::builder().keys(keys);
    match options {
        Some(options) => builder.options(options).build(),
        None => builder.build(),
    }
}

/// Create the indexes backing uniqueness and expiry guarantees.
///
/// Users: unique `username`, sparse-unique `user_id`/`email`, and a lookup
/// index for reset-token resolution. Tenant-scoped collections get compound
/// uniqueness on their natural key plus `created_by`, and the session/link
/// collections expire documents at their `expires_at` instant.
pub(crate) async fn ensure_indexes(db: &mongodb::Database) -> StoreResult<()> {
    db.collection::<mongodb::bson::Document>("users")
        .create_indexes(vec![
            index(doc! { "username": 1 }, Some(unique())),
            index(doc! { "user_id": 1 }, Some(unique_sparse())),
            index(doc! { "email": 1 }, Some(unique_sparse())),
            index(doc! { "reset_token": 1 }, None),
        ])
        .await?;

    db.collection::<mongodb::bson::Document>("students")
        .create_indexes(vec![
            index(doc! { "student_id": 1, "created_by": 1 }, Some(unique())),
            index(doc! { "created_by": 1 }, None),
        ])
        .await?;

    db.collection::<mongodb::bson::Document>("attendance")
        .create_indexes(vec![
            index(
                doc! { "student_id": 1, "date": 1, "created_by": 1 },
                Some(unique()),
            ),
            index(doc! { "created_by": 1 }, None),
            index(doc! { "created_by": 1, "date": 1 }, None),
        ])
        .await?;

    db.collection::<mongodb::bson::Document>("attendance_sessions")
        .create_indexes(vec![
            index(doc! { "session_id": 1 }, Some(unique())),
            index(doc! { "created_by": 1 }, None),
            index(doc! { "expires_at": 1 }, Some(ttl_now())),
        ])
        .await?;

    db.collection::<mongodb::bson::Document>("attendance_links")
        .create_indexes(vec![
            index(doc! { "link_id": 1 }, Some(unique())),
            index(doc! { "created_by": 1 }, None),
            index(doc! { "expires_at": 1 }, Some(ttl_now())),
        ])
        .await?;

    Ok(())
}
