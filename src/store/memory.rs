//! In-memory document store.
//!
//! Enforces the same revision rules as CouchDB, so the repository and the
//! crawler behave identically against it. Used for `--dry-run` and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, Revision, StoreError, StoredDocument, stamp};

#[derive(Debug)]
struct Entry {
    document: Value,
    generation: u64,
}

fn revision_of(generation: u64) -> Revision {
    Revision::new(format!("{generation}-mem"))
}

/// Documents kept in a map behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content of a document, if any.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.lock().get(id).map(|e| e.document.clone())
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of writes applied to a document (0 if absent).
    pub fn generation(&self, id: &str) -> u64 {
        self.lock().get(id).map_or(0, |e| e.generation)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock can't leave an entry half-written
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, id: &str) -> Result<StoredDocument, StoreError> {
        self.lock()
            .get(id)
            .map(|e| StoredDocument {
                document: e.document.clone(),
                revision: revision_of(e.generation),
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn put(
        &self,
        id: &str,
        mut document: Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let mut documents = self.lock();
        let current = documents.get(id).map(|e| e.generation);

        let generation = match (current, revision) {
            (None, None) => 1,
            (Some(current), Some(rev)) if revision_of(current) == *rev => current + 1,
            _ => return Err(StoreError::Conflict(id.to_string())),
        };

        let new_revision = revision_of(generation);
        stamp(&mut document, id, Some(&new_revision));
        documents.insert(
            id.to_string(),
            Entry {
                document,
                generation,
            },
        );
        Ok(new_revision)
    }
}
