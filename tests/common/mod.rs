#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use category_reconcile::domain::category::{CATEGORY_COLLECTION, PARENT_ID_FIELD, TYPE_FIELD};
use category_reconcile::domain::document::{non_empty_str, str_field, Document, DocumentId};
use category_reconcile::domain::CategoryType;
use category_reconcile::store::JsonDocumentStore;
use serde_json::Value;
use tempfile::TempDir;

/// Creates an isolated JSON store; keep the guard alive for the duration of the test.
pub fn json_store() -> (JsonDocumentStore, TempDir) {
    let temp = TempDir::new().expect("create temp dir");
    let store = JsonDocumentStore::open(temp.path()).expect("open json store");
    (store, temp)
}

/// Builds documents from a JSON array literal.
pub fn documents(value: Value) -> Vec<Document> {
    value
        .as_array()
        .expect("fixture must be an array")
        .iter()
        .map(|item| item.as_object().cloned().expect("fixture items must be objects"))
        .collect()
}

pub fn by_id(documents: &[Document]) -> HashMap<String, Document> {
    documents
        .iter()
        .filter_map(|doc| DocumentId::of(doc).map(|id| (id.as_str().to_string(), doc.clone())))
        .collect()
}

pub fn category_by_key<'a>(categories: &'a [Document], key: &str) -> &'a Document {
    categories
        .iter()
        .find(|doc| str_field(doc, "key") == Some(key))
        .unwrap_or_else(|| panic!("no category with key {key}"))
}

/// Every category carries one of the two allowed types.
pub fn assert_type_invariant(categories: &[Document]) {
    for doc in categories {
        let kind = str_field(doc, TYPE_FIELD).and_then(CategoryType::parse);
        assert!(kind.is_some(), "category {:?} has an invalid type", doc.get("id"));
    }
}

/// Every non-null parentId points at an existing category and chains end at a root.
pub fn assert_forest(categories: &[Document]) {
    let ids: HashSet<&str> = categories
        .iter()
        .filter_map(|doc| non_empty_str(doc, "id"))
        .collect();
    let parents: HashMap<&str, &str> = categories
        .iter()
        .filter_map(|doc| Some((non_empty_str(doc, "id")?, non_empty_str(doc, PARENT_ID_FIELD)?)))
        .collect();
    for (child, parent) in &parents {
        assert!(ids.contains(parent), "{child} points at missing parent {parent}");
    }
    for start in parents.keys() {
        let mut current = Some(*start);
        let mut hops = 0;
        while let Some(node) = current {
            hops += 1;
            assert!(hops <= categories.len() + 1, "cycle reachable from {start}");
            current = parents.get(node).copied();
        }
    }
}

pub fn read_categories(store: &JsonDocumentStore) -> Vec<Document> {
    store
        .read_collection(CATEGORY_COLLECTION)
        .expect("read categories")
}
