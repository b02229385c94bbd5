//! Document store abstraction consumed by the reconciliation engines.
//!
//! Engines only ever issue the three primitives of [`DocumentStore`]. Drivers
//! validate every filter and update before touching data.

pub mod json_backend;
pub mod memory;
pub mod query;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::domain::document::{Document, DocumentId, ID_FIELD};

pub use json_backend::JsonDocumentStore;
pub use memory::MemoryStore;
pub use query::{BulkWriteResult, Filter, Projection, Update, UpdateOp};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Timestamp written on inserted documents.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Failures raised by store drivers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Invalid document in `{collection}`: {reason}")]
    InvalidDocument { collection: String, reason: String },
}

impl StoreError {
    /// Connectivity-class failures abort a run; anything else is scoped to one request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Io(_) | StoreError::Serde(_) | StoreError::Unavailable(_)
        )
    }
}

/// The primitive operations every concrete document-store driver implements.
pub trait DocumentStore: Send + Sync {
    fn find(&self, collection: &str, filter: &Filter, projection: &Projection)
        -> Result<Vec<Document>>;

    fn bulk_update(&self, collection: &str, ops: &[UpdateOp]) -> Result<BulkWriteResult>;

    fn insert(&self, collection: &str, document: Document) -> Result<DocumentId>;
}

/// Validates a whole batch before any of it is applied.
pub(crate) fn validate_ops(ops: &[UpdateOp]) -> Result<()> {
    ops.iter().try_for_each(UpdateOp::validate)
}

/// Assigns a fresh canonical id and creation stamp to a document about to be inserted.
pub(crate) fn prepare_insert(
    collection: &str,
    mut document: Document,
) -> Result<(DocumentId, Document)> {
    if document.contains_key(ID_FIELD) {
        return Err(StoreError::InvalidDocument {
            collection: collection.to_string(),
            reason: "ids are assigned by the store".into(),
        });
    }
    let id = DocumentId::generate();
    document.insert(ID_FIELD.into(), Value::from(&id));
    document
        .entry(CREATED_AT_FIELD)
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)));
    Ok((id, document))
}

/// Runs `find` and projects the documents. Shared by the drivers.
pub(crate) fn select(
    documents: &[Document],
    filter: &Filter,
    projection: &Projection,
) -> Result<Vec<Document>> {
    filter.validate()?;
    Ok(documents
        .iter()
        .filter(|document| filter.matches(document))
        .map(|document| projection.apply(document))
        .collect())
}
