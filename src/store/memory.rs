//! In-memory document store
//!
//! This module provides a process-local [`DocumentStore`] used by the CLI
//! and the test suites. State can be written to and restored from a JSON
//! snapshot file.

use crate::document::{Datum, Document, ID_FIELD};
use crate::error::{Error, Result};
use crate::store::engine::{DocumentStore, Projection, Update, UpdateResult};
use crate::store::Filter;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A single collection: documents in insertion order plus index specs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemoryCollection {
    documents: Vec<Document>,
    #[serde(default)]
    indexes: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, MemoryCollection>,
    closed: bool,
}

/// In-memory document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish()
    }
}

impl MemoryStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection (0 if it does not exist)
    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .read()
            .collections
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// Index specs recorded for a collection
    pub fn indexes(&self, collection: &str) -> Vec<Vec<String>> {
        self.state
            .read()
            .collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    /// Whether [`close`](DocumentStore::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// Write every collection to `path` as pretty-printed JSON
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = {
            let state = self.state.read();
            serde_json::to_vec_pretty(&state.collections)
                .map_err(|e| Error::SerializationError(e.to_string()))?
        };
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "Saved snapshot");
        Ok(())
    }

    /// Restore a store from a snapshot written by [`save_snapshot`](Self::save_snapshot)
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let collections: BTreeMap<String, MemoryCollection> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::SerializationError(e.to_string()))?;
        debug!(
            path = %path.as_ref().display(),
            collections = collections.len(),
            "Loaded snapshot"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(State {
                collections,
                closed: false,
            })),
        })
    }

    fn ensure_open(state: &State, collection: &str) -> Result<()> {
        if state.closed {
            return Err(Error::CollectionUnavailable(format!(
                "{}: store is closed",
                collection
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Option<Document>> {
        let state = self.state.read();
        Self::ensure_open(&state, collection)?;

        Ok(state.collections.get(collection).and_then(|c| {
            c.documents
                .iter()
                .find(|doc| filter.matches(doc))
                .map(|doc| projection.apply(doc.clone()))
        }))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>> {
        let state = self.state.read();
        Self::ensure_open(&state, collection)?;

        Ok(state
            .collections
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|doc| filter.matches(doc))
                    .map(|doc| projection.apply(doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let mut state = self.state.write();
        Self::ensure_open(&state, collection)?;

        let mut result = UpdateResult::default();

        if let Some(c) = state.collections.get_mut(collection) {
            for doc in c.documents.iter_mut().filter(|doc| filter.matches(doc)) {
                result.matched += 1;
                if update.apply(doc) {
                    result.modified += 1;
                }
            }
        }

        if result.matched == 0 && upsert {
            let id = Uuid::new_v4().to_string();
            let mut doc: Document = filter.equalities().into_iter().collect();
            update.apply(&mut doc);
            doc.insert(ID_FIELD.to_string(), Datum::String(id.clone()));

            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .documents
                .push(doc);
            result.upserted_id = Some(id);
        }

        debug!(
            collection,
            matched = result.matched,
            modified = result.modified,
            upserted = result.upserted_id.is_some(),
            "update_many"
        );
        Ok(result)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut state = self.state.write();
        Self::ensure_open(&state, collection)?;

        let Some(c) = state.collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = c.documents.len();
        c.documents.retain(|doc| !filter.matches(doc));
        let deleted = (before - c.documents.len()) as u64;

        debug!(collection, deleted, "delete_many");
        Ok(deleted)
    }

    async fn create_index(&self, collection: &str, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Err(Error::InvalidArgument(
                "index requires at least one field".to_string(),
            ));
        }

        let mut state = self.state.write();
        Self::ensure_open(&state, collection)?;

        let c = state.collections.entry(collection.to_string()).or_default();
        if !c.indexes.iter().any(|existing| existing.as_slice() == fields) {
            c.indexes.push(fields.to_vec());
            debug!(collection, ?fields, "Created index");
        }
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        if state.closed {
            return Err(Error::Storage("store is closed".to_string()));
        }
        Ok(state.collections.keys().cloned().collect())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        let mut state = self.state.write();
        Self::ensure_open(&state, collection)?;

        state
            .collections
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| Error::Storage(format!("ns not found: {}", collection)))
    }

    async fn close(&self) -> Result<()> {
        self.state.write().closed = true;
        Ok(())
    }
}
