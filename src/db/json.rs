//! JSON-file fallback backend.
//!
//! One pretty-printed JSON array per collection under a data directory.
//! Every operation loads the file, works on the parsed documents, and
//! rewrites the file, all under a per-collection async mutex. Query
//! semantics are identical to the document-database backend for the
//! operators the core uses (equality, existence, `$set`).

use std::marker::PhantomData;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use super::collection::{DocumentCollection, StoreError, StoreResult, UpdateOutcome};
use super::filter::{Filter, Update};
use async_trait::async_trait;

/// File-backed document collection.
pub struct JsonCollection<T> {
    path: PathBuf,
    unique_keys: &'static [&'static str],
    ttl_field: Option<&'static str>,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T> {
    /// Open a collection stored at `path`. The file is created lazily on the
    /// first write; a missing file reads as an empty collection.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unique_keys: &[],
            ttl_field: None,
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Enforce sparse uniqueness on the given top-level fields at insert
    /// time. Documents where a key is absent or null are exempt.
    #[must_use]
    pub fn with_unique_keys(mut self, keys: &'static [&'static str]) -> Self {
        self.unique_keys = keys;
        self
    }

    /// Treat documents whose `field` timestamp lies in the past as expired:
    /// they are dropped from every read and purged from the file.
    #[must_use]
    pub fn with_ttl(mut self, field: &'static str) -> Self {
        self.ttl_field = Some(field);
        self
    }

    async fn load(&self) -> StoreResult<Vec<Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let mut documents: Vec<Value> = serde_json::from_slice(&bytes)?;

        if let Some(field) = self.ttl_field {
            let now = Utc::now();
            let live_count = documents.len();
            documents.retain(|doc| !is_expired(doc, field, now));
            if documents.len() < live_count {
                self.save(&documents).await?;
            }
        }
        Ok(documents)
    }

    async fn save(&self, documents: &[Value]) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(documents)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn check_unique(&self, documents: &[Value], candidate: &Value) -> StoreResult<()> {
        for key in self.unique_keys {
            let value = candidate.get(*key).unwrap_or(&Value::Null);
            if value.is_null() {
                continue;
            }
            if documents
                .iter()
                .any(|doc| doc.get(*key).unwrap_or(&Value::Null) == value)
            {
                return Err(StoreError::DuplicateKey((*key).to_string()));
            }
        }
        Ok(())
    }
}

/// A document is expired when its TTL field parses as an RFC 3339 instant in
/// the past. Documents without the field, or with an unparsable value, never
/// expire.
fn is_expired(document: &Value, field: &str, now: DateTime<Utc>) -> bool {
    document
        .get(field)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .is_some_and(|expires_at| expires_at <= now)
}

#[async_trait]
impl<T> DocumentCollection<T> for JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn find_one(&self, filter: Filter) -> StoreResult<Option<T>> {
        let _guard = self.lock.lock().await;
        let documents = self.load().await?;
        documents
            .into_iter()
            .find(|doc| filter.matches(doc))
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .transpose()
    }

    async fn find(&self, filter: Filter) -> StoreResult<Vec<T>> {
        let _guard = self.lock.lock().await;
        let documents = self.load().await?;
        documents
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    async fn insert_one(&self, document: &T) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        let candidate = serde_json::to_value(document)?;
        self.check_unique(&documents, &candidate)?;
        documents.push(candidate);
        self.save(&documents).await
    }

    async fn update_one(
        &self,
        filter: Filter,
        update: Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;

        if let Some(doc) = documents.iter_mut().find(|doc| filter.matches(doc)) {
            let before = doc.clone();
            update.apply(doc);
            let modified = u64::from(*doc != before);
            self.save(&documents).await?;
            return Ok(UpdateOutcome {
                matched: 1,
                modified,
            });
        }

        if upsert {
            let mut seeded = filter.to_seed();
            for (field, value) in update.as_map() {
                seeded.insert(field.clone(), value.clone());
            }
            documents.push(Value::Object(seeded));
            self.save(&documents).await?;
        }
        Ok(UpdateOutcome::default())
    }

    async fn update_many(&self, filter: Filter, update: Update) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        let mut modified = 0;
        for doc in documents.iter_mut().filter(|doc| filter.matches(doc)) {
            let before = doc.clone();
            update.apply(doc);
            if *doc != before {
                modified += 1;
            }
        }
        self.save(&documents).await?;
        Ok(modified)
    }

    async fn delete_many(&self, filter: Filter) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        let before = documents.len();
        documents.retain(|doc| !filter.matches(doc));
        let deleted = (before - documents.len()) as u64;
        self.save(&documents).await?;
        Ok(deleted)
    }

    async fn count_documents(&self, filter: Filter) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let documents = self.load().await?;
        Ok(documents.iter().filter(|doc| filter.matches(doc)).count() as u64)
    }
}
