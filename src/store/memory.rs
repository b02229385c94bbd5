//! In-process store used by unit tests and embedding callers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::domain::document::{Document, DocumentId};

use super::query::apply_bulk;
use super::{
    prepare_insert, select, validate_ops, BulkWriteResult, DocumentStore, Filter, Projection,
    Result, StoreError, UpdateOp,
};

type Collections = BTreeMap<String, Vec<Document>>;

/// Insertion-ordered collections held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads raw documents as-is, keeping whatever ids they already carry.
    pub fn load(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
        if let Ok(mut guard) = self.collections.write() {
            guard
                .entry(collection.to_string())
                .or_default()
                .extend(documents);
        }
    }

    /// Parses a JSON array of objects into a collection.
    pub fn load_json(&self, collection: &str, json: &str) -> Result<()> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        let mut documents = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::Object(document) => documents.push(document),
                other => {
                    return Err(StoreError::InvalidDocument {
                        collection: collection.to_string(),
                        reason: format!("expected an object, found {other}"),
                    })
                }
            }
        }
        self.load(collection, documents);
        Ok(())
    }

    /// Snapshot of a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.read()
            .map(|guard| guard.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn get(&self, collection: &str, id: &DocumentId) -> Option<Document> {
        self.documents(collection)
            .into_iter()
            .find(|document| DocumentId::of(document).as_ref() == Some(id))
    }

    /// Simulates losing the connection; every primitive fails until reconnected.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.ensure_online()?;
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.ensure_online()?;
        self.collections
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl DocumentStore for MemoryStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>> {
        let guard = self.read()?;
        match guard.get(collection) {
            Some(documents) => select(documents, filter, projection),
            None => {
                filter.validate()?;
                Ok(Vec::new())
            }
        }
    }

    fn bulk_update(&self, collection: &str, ops: &[UpdateOp]) -> Result<BulkWriteResult> {
        validate_ops(ops)?;
        let mut guard = self.write()?;
        Ok(match guard.get_mut(collection) {
            Some(documents) => apply_bulk(documents, ops),
            None => BulkWriteResult::default(),
        })
    }

    fn insert(&self, collection: &str, document: Document) -> Result<DocumentId> {
        let (id, document) = prepare_insert(collection, document)?;
        let mut guard = self.write()?;
        guard
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }
}
