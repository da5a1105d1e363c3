//! Document Collection
//!
//! JSON-object documents with equality / array-membership filters.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CacheError, Result};

/// A stored document.
pub type Document = Map<String, Value>;

/// Operations the school/student helpers need from a collection.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Documents matching every `(field, value)` pair of `filter`, in insertion order.
    async fn find(&self, filter: &Document) -> Result<Vec<Document>>;

    /// Inserts `doc`, assigning a UUID `_id` when it has none, and returns the id.
    async fn insert_one(&self, doc: Document) -> Result<Value>;

    /// Sets every field of `set` on each document matching `filter`.
    ///
    /// Returns the number of documents changed.
    async fn update_many(&self, filter: &Document, set: &Document) -> Result<u64>;
}

/// Whether `doc` satisfies `filter`.
///
/// A field matches when equal to the filter value, or when it is an array
/// containing the value.
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, expected)| match doc.get(field) {
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
        None => expected.is_null(),
    })
}

/// Converts a JSON value into a document, rejecting non-objects.
pub(crate) fn into_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CacheError::InvalidDocument(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

// == Memory Collection ==
#[derive(Debug, Default)]
pub struct MemoryCollection {
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn find(&self, filter: &Document) -> Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, mut doc: Document) -> Result<Value> {
        let id = doc
            .entry("_id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();

        let mut docs = self.docs.write().await;
        if docs.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(CacheError::InvalidDocument(format!("duplicate _id {}", id)));
        }
        docs.push(doc);
        debug!("Inserted document {}", id);
        Ok(id)
    }

    async fn update_many(&self, filter: &Document, set: &Document) -> Result<u64> {
        let mut docs = self.docs.write().await;
        let mut modified = 0;
        for doc in docs.iter_mut().filter(|doc| matches_filter(doc, filter)) {
            let mut changed = false;
            for (field, value) in set {
                if doc.get(field) != Some(value) {
                    doc.insert(field.clone(), value.clone());
                    changed = true;
                }
            }
            if changed {
                modified += 1;
            }
        }
        Ok(modified)
    }
}
