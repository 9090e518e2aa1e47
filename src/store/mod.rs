//! Document store adapter.
//!
//! Entities are written to a CouchDB-style store: JSON documents keyed by
//! id, each carrying an opaque `_rev` token. A write must name the current
//! revision of an existing document; a missing or stale revision is a
//! [`StoreError::Conflict`].
//!
//! # Architecture
//!
//! ```text
//! Scheduler → EntityRepository (upsert, revision cache) → DocumentStore
//!                                                           ├── CouchStore (HTTP)
//!                                                           └── MemoryStore (dry runs, tests)
//! ```

pub mod couch;
pub mod memory;
pub mod repository;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use couch::CouchStore;
pub use memory::MemoryStore;
pub use repository::EntityRepository;

/// Opaque optimistic-concurrency token (`_rev`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: Value,
    pub revision: Revision,
}

/// Get-by-id and put-with-revision against a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document and its current revision.
    async fn fetch(&self, id: &str) -> Result<StoredDocument, StoreError>;

    /// Write a document. `revision` must be the current revision when the
    /// document exists, and `None` when it doesn't.
    async fn put(
        &self,
        id: &str,
        document: Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn fetch(&self, id: &str) -> Result<StoredDocument, StoreError> {
        (**self).fetch(id).await
    }

    async fn put(
        &self,
        id: &str,
        document: Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        (**self).put(id, document, revision).await
    }
}

/// Document store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Missing or stale revision
    #[error("Revision conflict on {0}")]
    Conflict(String),

    /// The write still conflicted after refetching the revision
    #[error("Repeated revision conflict on {0}")]
    RepeatedConflict(String),

    #[error("Store unreachable: {0}")]
    Transport(String),

    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Only a repeated conflict stops the crawl; everything else is
    /// retried at flush time.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::RepeatedConflict(_))
    }
}

/// Set the identity fields a document needs before it's written.
pub(crate) fn stamp(document: &mut Value, id: &str, revision: Option<&Revision>) {
    if let Value::Object(map) = document {
        map.insert("_id".to_string(), Value::String(id.to_string()));
        match revision {
            Some(rev) => {
                map.insert("_rev".to_string(), Value::String(rev.as_str().to_string()));
            }
            None => {
                map.remove("_rev");
            }
        }
    }
}
