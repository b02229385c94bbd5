use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::Value;
use tracing::debug;

use crate::domain::document::{Document, DocumentId};
use crate::utils::persistence::replace_file;

use super::query::apply_bulk;
use super::{
    prepare_insert, select, validate_ops, BulkWriteResult, DocumentStore, Filter, Projection,
    Result, StoreError, UpdateOp,
};

const COLLECTION_EXTENSION: &str = "json";

/// Filesystem-backed store keeping one JSON array per collection.
#[derive(Debug)]
pub struct JsonDocumentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDocumentStore {
    /// Opens an existing store directory. A missing directory means the store is unreachable.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "store directory `{}` does not exist",
                root.display()
            )));
        }
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Creates the store directory when needed, then opens it.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!(
            "{}.{}",
            canonical_name(collection),
            COLLECTION_EXTENSION
        ))
    }

    /// Replaces a collection wholesale. Used to import fixtures and legacy dumps.
    pub fn import(&self, collection: &str, documents: &[Document]) -> Result<()> {
        let _guard = self.lock()?;
        self.write_collection(collection, documents)
    }

    pub fn read_collection(&self, collection: &str) -> Result<Vec<Document>> {
        self.ensure_reachable()?;
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        let values: Vec<Value> = serde_json::from_str(&data)?;
        values
            .into_iter()
            .map(|value| match value {
                Value::Object(document) => Ok(document),
                other => Err(StoreError::InvalidDocument {
                    collection: collection.to_string(),
                    reason: format!("expected an object, found {other}"),
                }),
            })
            .collect()
    }

    fn write_collection(&self, collection: &str, documents: &[Document]) -> Result<()> {
        self.ensure_reachable()?;
        let path = self.collection_path(collection);
        let json = serde_json::to_string_pretty(documents)?;
        replace_file(&path, &json)?;
        debug!(collection, count = documents.len(), "collection written");
        Ok(())
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "store directory `{}` disappeared",
                self.root.display()
            )))
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store write lock poisoned".into()))
    }
}

impl DocumentStore for JsonDocumentStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>> {
        let documents = self.read_collection(collection)?;
        select(&documents, filter, projection)
    }

    fn bulk_update(&self, collection: &str, ops: &[UpdateOp]) -> Result<BulkWriteResult> {
        validate_ops(ops)?;
        let _guard = self.lock()?;
        let mut documents = self.read_collection(collection)?;
        let result = apply_bulk(&mut documents, ops);
        if result.modified > 0 {
            self.write_collection(collection, &documents)?;
        }
        Ok(result)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<DocumentId> {
        let (id, document) = prepare_insert(collection, document)?;
        let _guard = self.lock()?;
        let mut documents = self.read_collection(collection)?;
        documents.push(document);
        self.write_collection(collection, &documents)?;
        Ok(id)
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "collection".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Update;
    use crate::utils::persistence::tmp_path;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonDocumentStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonDocumentStore::open(temp.path()).expect("json store");
        (store, temp)
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let temp = TempDir::new().expect("temp dir");
        let err = JsonDocumentStore::open(temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn missing_collection_reads_as_empty() {
        let (store, _guard) = store_with_temp_dir();
        let found = store
            .find("Category", &Filter::All, &Projection::All)
            .expect("find");
        assert!(found.is_empty());
    }

    #[test]
    fn insert_and_update_persist_across_handles() {
        let (store, guard) = store_with_temp_dir();
        let document = json!({ "label": "Infra", "key": "infra" })
            .as_object()
            .cloned()
            .unwrap();
        let id = store.insert("Category", document).expect("insert");
        let result = store
            .bulk_update(
                "Category",
                &[UpdateOp::many(
                    Filter::eq("key", "infra"),
                    Update::set("type", "EXPENSE"),
                )],
            )
            .expect("update");
        assert_eq!(result.modified, 1);

        let reopened = JsonDocumentStore::open(guard.path()).expect("reopen");
        let documents = reopened.read_collection("Category").expect("read");
        assert_eq!(documents.len(), 1);
        assert_eq!(DocumentId::of(&documents[0]), Some(id));
        assert_eq!(documents[0].get("type"), Some(&json!("EXPENSE")));
        assert!(!tmp_path(&store.collection_path("Category")).exists());
    }

    #[test]
    fn malformed_filters_are_rejected_on_empty_collections() {
        let (store, _guard) = store_with_temp_dir();
        let err = store
            .find("Category", &Filter::or(Vec::new()), &Projection::All)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }

    #[test]
    fn collection_names_are_sanitized() {
        let (store, _guard) = store_with_temp_dir();
        let path = store.collection_path("../Category");
        assert_eq!(path.parent(), Some(store.root()));
    }
}
