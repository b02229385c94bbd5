//! Domain types representing tree-structured finance categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::common::NamedEntity;
use crate::domain::document::{non_empty_str, str_field, Document, DocumentId};

/// Collection holding category documents.
pub const CATEGORY_COLLECTION: &str = "Category";

pub const LABEL_FIELD: &str = "label";
pub const TYPE_FIELD: &str = "type";
pub const PARENT_ID_FIELD: &str = "parentId";
pub const ORDER_FIELD: &str = "order";
pub const KEY_FIELD: &str = "key";
pub const PARENT_KEY_FIELD: &str = "parentKey";

/// Supported category discriminants.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    #[default]
    Expense,
    Revenue,
}

impl CategoryType {
    pub const ALL: [CategoryType; 2] = [CategoryType::Expense, CategoryType::Revenue];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Expense => "EXPENSE",
            CategoryType::Revenue => "REVENUE",
        }
    }

    /// Parses the stored discriminant; anything but the exact uppercase names is invalid.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CategoryType> for Value {
    fn from(kind: CategoryType) -> Self {
        Value::String(kind.as_str().to_string())
    }
}

/// How a category is linked to its parent while the migration is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLink {
    /// Imported before canonical ids existed; still carries the human-assigned keys.
    Legacy {
        key: String,
        parent_key: Option<String>,
    },
    /// Linked through `parentId` only.
    Canonical,
}

impl CategoryLink {
    /// Reads the legacy key columns; a row without a usable `key` is canonical.
    pub fn from_document(document: &Document) -> Self {
        match non_empty_str(document, KEY_FIELD) {
            Some(key) => CategoryLink::Legacy {
                key: key.to_string(),
                parent_key: non_empty_str(document, PARENT_KEY_FIELD).map(str::to_string),
            },
            None => CategoryLink::Canonical,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            CategoryLink::Legacy { key, .. } => Some(key),
            CategoryLink::Canonical => None,
        }
    }
}

/// A node of the category forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: DocumentId,
    pub label: String,
    pub kind: CategoryType,
    pub parent_id: Option<DocumentId>,
    pub order: i64,
}

impl Category {
    /// Decodes a stored category. Returns `None` when the document lacks an id or a valid type.
    pub fn from_document(document: &Document) -> Option<Self> {
        let id = DocumentId::of(document)?;
        let kind = str_field(document, TYPE_FIELD).and_then(CategoryType::parse)?;
        Some(Self {
            id,
            label: str_field(document, LABEL_FIELD).unwrap_or_default().to_string(),
            kind,
            parent_id: non_empty_str(document, PARENT_ID_FIELD).map(DocumentId::new),
            order: document
                .get(ORDER_FIELD)
                .and_then(Value::as_i64)
                .unwrap_or_default(),
        })
    }
}

/// A category that has not been persisted yet. Seeded nodes are always canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub label: String,
    pub kind: CategoryType,
    pub parent_id: Option<DocumentId>,
    pub order: i64,
}

impl NewCategory {
    pub fn root(label: impl Into<String>, kind: CategoryType, order: i64) -> Self {
        Self {
            label: label.into(),
            kind,
            parent_id: None,
            order,
        }
    }

    pub fn child(
        label: impl Into<String>,
        kind: CategoryType,
        parent_id: DocumentId,
        order: i64,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            parent_id: Some(parent_id),
            order,
        }
    }

    /// Builds the insert payload. Legacy fields are never written.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(LABEL_FIELD.into(), Value::String(self.label.clone()));
        document.insert(TYPE_FIELD.into(), self.kind.into());
        document.insert(
            PARENT_ID_FIELD.into(),
            self.parent_id.as_ref().map(Value::from).unwrap_or(Value::Null),
        );
        document.insert(ORDER_FIELD.into(), Value::from(self.order));
        document
    }
}

impl NamedEntity for Category {
    fn label(&self) -> &str {
        &self.label
    }
}

/// Linkage columns of one category, read by the key index and the parent backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLinkRow {
    pub id: DocumentId,
    pub parent_id: Option<DocumentId>,
    pub link: CategoryLink,
}

impl CategoryLinkRow {
    /// Decodes a projected row; rows without an id are dropped by the caller.
    pub fn from_document(document: &Document) -> Option<Self> {
        Some(Self {
            id: DocumentId::of(document)?,
            parent_id: non_empty_str(document, PARENT_ID_FIELD).map(DocumentId::new),
            link: CategoryLink::from_document(document),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn type_parsing_is_exact() {
        assert_eq!(CategoryType::parse("EXPENSE"), Some(CategoryType::Expense));
        assert_eq!(CategoryType::parse("REVENUE"), Some(CategoryType::Revenue));
        assert_eq!(CategoryType::parse("expense"), None);
        assert_eq!(CategoryType::parse("INCOME"), None);
    }

    #[test]
    fn legacy_fields_decode_into_legacy_link() {
        let row = CategoryLinkRow::from_document(&doc(json!({
            "id": "c1",
            "key": "hosting",
            "parentKey": "infra",
            "parentId": null
        })))
        .expect("row");
        assert_eq!(
            row.link,
            CategoryLink::Legacy {
                key: "hosting".into(),
                parent_key: Some("infra".into()),
            }
        );
        assert!(row.parent_id.is_none());
    }

    #[test]
    fn blank_key_means_canonical() {
        let row = CategoryLinkRow::from_document(&doc(json!({
            "id": "c2", "key": "", "parentKey": "infra", "parentId": "p"
        })))
        .expect("row");
        assert_eq!(row.link, CategoryLink::Canonical);
        assert_eq!(row.link.key(), None);
        assert_eq!(row.parent_id, Some(DocumentId::new("p")));
    }

    #[test]
    fn category_decodes_order_and_parent() {
        let category = Category::from_document(&doc(json!({
            "id": "c1", "label": "Hosting", "type": "EXPENSE", "parentId": "p", "order": 3
        })))
        .expect("category");
        assert_eq!(category.label(), "Hosting");
        assert_eq!(category.parent_id, Some(DocumentId::new("p")));
        assert_eq!(category.order, 3);
    }

    #[test]
    fn invalid_type_is_not_decoded() {
        assert!(Category::from_document(&doc(json!({ "id": "c1", "label": "X" }))).is_none());
        assert!(Category::from_document(&doc(json!({
            "id": "c1", "label": "X", "type": "OTHER"
        })))
        .is_none());
    }

    #[test]
    fn new_category_document_has_no_legacy_fields() {
        let node = NewCategory::child("Hosting", CategoryType::Expense, DocumentId::new("p"), 1);
        let document = node.to_document();
        assert_eq!(document.get(PARENT_ID_FIELD), Some(&json!("p")));
        assert_eq!(document.get(TYPE_FIELD), Some(&json!("EXPENSE")));
        assert!(!document.contains_key(KEY_FIELD));
        assert!(!document.contains_key(PARENT_KEY_FIELD));

        let decoded = CategoryLinkRow::from_document(&{
            let mut stored = document.clone();
            stored.insert("id".into(), json!("n1"));
            stored
        })
        .expect("decoded");
        assert_eq!(decoded.link, CategoryLink::Canonical);
    }
}
