//! The slice of the transaction entity this crate is allowed to touch.

use crate::domain::document::{non_empty_str, Document, DocumentId};

/// Collection holding transaction documents owned by the application.
pub const TRANSACTION_COLLECTION: &str = "Transaction";

pub const CATEGORY_FIELD: &str = "category";
pub const CATEGORY_ID_FIELD: &str = "categoryId";

/// Category linkage of a transaction. Every other field stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionLink {
    pub id: DocumentId,
    pub category: Option<String>,
    pub category_id: Option<DocumentId>,
}

impl TransactionLink {
    pub fn from_document(document: &Document) -> Option<Self> {
        Some(Self {
            id: DocumentId::of(document)?,
            category: non_empty_str(document, CATEGORY_FIELD).map(str::to_string),
            category_id: non_empty_str(document, CATEGORY_ID_FIELD).map(DocumentId::new),
        })
    }

    /// A transaction needs a backfill when it has a legacy category but no canonical link.
    pub fn needs_backfill(&self) -> bool {
        self.category.is_some() && self.category_id.is_none()
    }
}
