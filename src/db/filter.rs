//! Typed document filters and updates.
//!
//! Both store backends consume the same small predicate structure instead of
//! free-form dictionaries: a filter is an ordered list of `(field, predicate)`
//! clauses combined with AND, and an update is a `$set`-style field map.
//! Filters evaluate directly against JSON documents in the file backend and
//! convert to BSON for the document database.

use mongodb::bson::{self, Document, doc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::collection::{StoreError, StoreResult};

/// A single filter clause applied to one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the given value. A missing field compares as JSON null,
    /// matching the document database's treatment of `{field: null}`.
    Eq(Value),

    /// Field is present (`true`) or absent (`false`). A field holding null
    /// still counts as present.
    Exists(bool),
}

/// Conjunction of field predicates. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    /// Create an empty filter (matches all documents).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Predicate::Eq(value.into())));
        self
    }

    /// Add an existence clause.
    #[must_use]
    pub fn exists(mut self, field: &str, exists: bool) -> Self {
        self.clauses
            .push((field.to_string(), Predicate::Exists(exists)));
        self
    }

    /// Whether this filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the filter against a JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        self.clauses.iter().all(|(field, predicate)| match predicate {
            Predicate::Eq(value) => document.get(field).unwrap_or(&Value::Null) == value,
            Predicate::Exists(wanted) => document.get(field).is_some() == *wanted,
        })
    }

    /// Convert to a BSON query document for the database backend.
    pub(crate) fn to_document(&self) -> StoreResult<Document> {
        let mut query = Document::new();
        for (field, predicate) in &self.clauses {
            match predicate {
                Predicate::Eq(value) => {
                    query.insert(field.clone(), bson::to_bson(value)?);
                }
                Predicate::Exists(exists) => {
                    query.insert(field.clone(), doc! { "$exists": *exists });
                }
            }
        }
        Ok(query)
    }

    /// Equality clauses as a seed document for upserts, mirroring how the
    /// database backend materializes the query on an upserted insert.
    /// Existence clauses carry no value and are skipped.
    pub(crate) fn to_seed(&self) -> Map<String, Value> {
        let mut seed = Map::new();
        for (field, predicate) in &self.clauses {
            if let Predicate::Eq(value) = predicate {
                seed.insert(field.clone(), value.clone());
            }
        }
        seed
    }
}

/// A `$set` update: every listed field is overwritten with its new value.
/// Setting a field to null clears it without removing the key.
#[derive(Debug, Clone, Default)]
pub struct Update {
    set: Map<String, Value>,
}

impl Update {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a new value. Values that cannot be represented as JSON
    /// degrade to null; every type persisted through this crate serializes
    /// infallibly.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.set.insert(field.to_string(), value);
        self
    }

    /// Whether this update sets no fields.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Apply the update to a JSON document in place.
    pub(crate) fn apply(&self, document: &mut Value) {
        if let Value::Object(fields) = document {
            for (field, value) in &self.set {
                fields.insert(field.clone(), value.clone());
            }
        }
    }

    /// Set fields as a plain JSON map, used when materializing upserts.
    pub(crate) fn as_map(&self) -> &Map<String, Value> {
        &self.set
    }

    /// Convert to a BSON `$set` update document for the database backend.
    pub(crate) fn to_document(&self) -> StoreResult<Document> {
        let mut set = Document::new();
        for (field, value) in &self.set {
            set.insert(field.clone(), bson::to_bson(value)?);
        }
        Ok(doc! { "$set": set })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::new();
        assert!(filter.matches(&json!({"username": "alice"})));
        assert!(filter.matches(&json!({})));
    }

    #[test]
    fn eq_treats_missing_field_as_null() {
        let filter = Filter::new().eq("reset_token", Value::Null);
        assert!(filter.matches(&json!({"username": "alice"})));
        assert!(filter.matches(&json!({"reset_token": null})));
        assert!(!filter.matches(&json!({"reset_token": "abc"})));
    }

    #[test]
    fn exists_counts_null_fields_as_present() {
        let filter = Filter::new().exists("user_id", true);
        assert!(filter.matches(&json!({"user_id": null})));
        assert!(filter.matches(&json!({"user_id": "u-1"})));
        assert!(!filter.matches(&json!({"username": "alice"})));

        let absent = Filter::new().exists("user_id", false);
        assert!(absent.matches(&json!({"username": "alice"})));
        assert!(!absent.matches(&json!({"user_id": null})));
    }

    #[test]
    fn clauses_combine_with_and() {
        let filter = Filter::new()
            .eq("username", "alice")
            .eq("failed_attempts", 4);
        assert!(filter.matches(&json!({"username": "alice", "failed_attempts": 4})));
        assert!(!filter.matches(&json!({"username": "alice", "failed_attempts": 5})));
        assert!(!filter.matches(&json!({"username": "bob", "failed_attempts": 4})));
    }

    #[test]
    fn update_overwrites_and_clears_fields() {
        let mut doc = json!({"username": "alice", "failed_attempts": 4, "reset_token": "old"});
        Update::new()
            .set("failed_attempts", 0u32)
            .set("reset_token", Option::<String>::None)
            .apply(&mut doc);
        assert_eq!(doc["failed_attempts"], json!(0));
        assert_eq!(doc["reset_token"], Value::Null);
        assert_eq!(doc["username"], json!("alice"));
    }

    #[test]
    fn filter_converts_to_bson_query() {
        let filter = Filter::new().eq("username", "alice").exists("email", false);
        let query = filter.to_document().unwrap();
        assert_eq!(query.get_str("username").unwrap(), "alice");
        assert_eq!(
            query.get_document("email").unwrap().get_bool("$exists").unwrap(),
            false
        );
    }

    #[test]
    fn update_converts_to_set_document() {
        let update = Update::new().set("is_locked", true);
        let document = update.to_document().unwrap();
        assert!(document.get_document("$set").unwrap().get_bool("is_locked").unwrap());
    }
}
