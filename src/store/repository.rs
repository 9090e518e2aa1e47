//! Entity upserts with optimistic concurrency.
//!
//! The repository remembers the last revision it wrote for every id and
//! threads it into the next write, so a crawl only fetches a document the
//! first time it touches it. A conflict triggers one refetch-and-retry;
//! a second conflict on the same write is [`StoreError::RepeatedConflict`].

use std::collections::HashMap;

use serde_json::Value;

use super::{DocumentStore, Revision, StoreError};
use crate::model::{Artist, Track};

/// Writes entities through a [`DocumentStore`], caching revisions.
pub struct EntityRepository<S> {
    store: S,
    revisions: HashMap<String, Revision>,
    writes: usize,
}

impl<S: DocumentStore> EntityRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            revisions: HashMap::new(),
            writes: 0,
        }
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Last revision written for an id, if any.
    pub fn known_revision(&self, id: &str) -> Option<&Revision> {
        self.revisions.get(id)
    }

    /// Create or overwrite a document, returning its new revision.
    pub async fn upsert(&mut self, id: &str, document: Value) -> Result<Revision, StoreError> {
        let known = match self.revisions.get(id) {
            Some(rev) => Some(rev.clone()),
            None => self.current_revision(id).await?,
        };

        let revision = match self.store.put(id, document.clone(), known.as_ref()).await {
            Ok(rev) => rev,
            Err(StoreError::Conflict(_)) => {
                tracing::debug!(id, "Revision conflict, refetching");
                let fresh = self.current_revision(id).await?;
                match self.store.put(id, document, fresh.as_ref()).await {
                    Ok(rev) => rev,
                    Err(StoreError::Conflict(_)) => {
                        return Err(StoreError::RepeatedConflict(id.to_string()));
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        self.revisions.insert(id.to_string(), revision.clone());
        self.writes += 1;
        Ok(revision)
    }

    pub async fn upsert_artist(&mut self, artist: &Artist) -> Result<Revision, StoreError> {
        self.upsert(&artist.id, artist.to_document()).await
    }

    pub async fn upsert_track(&mut self, track: &Track) -> Result<Revision, StoreError> {
        self.upsert(&track.id, track.to_document()).await
    }

    async fn current_revision(&self, id: &str) -> Result<Option<Revision>, StoreError> {
        match self.store.fetch(id).await {
            Ok(stored) => Ok(Some(stored.revision)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
