//! Legacy key → canonical id index, rebuilt per run and never persisted.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::domain::category::{
    CategoryLinkRow, CATEGORY_COLLECTION, KEY_FIELD, PARENT_ID_FIELD, PARENT_KEY_FIELD,
};
use crate::domain::document::DocumentId;
use crate::store::{self, DocumentStore, Filter, Projection};

/// Maps legacy category keys to canonical ids. Duplicate keys resolve last-write-wins,
/// but every record carrying a key stays reachable through [`KeyIndex::holders`].
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    by_key: HashMap<String, DocumentId>,
    holders: HashMap<String, Vec<DocumentId>>,
    duplicates: BTreeSet<String>,
}

impl KeyIndex {
    /// Indexes legacy rows; canonical rows carry no key and are left out.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a CategoryLinkRow>) -> Self {
        Self::from_pairs(
            rows.into_iter()
                .filter_map(|row| row.link.key().map(|key| (key, &row.id))),
        )
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a DocumentId)>) -> Self {
        let mut index = Self::default();
        for (key, id) in pairs {
            if key.is_empty() {
                continue;
            }
            let holders = index.holders.entry(key.to_string()).or_default();
            if !holders.contains(id) {
                holders.push(id.clone());
            }
            if let Some(previous) = index.by_key.insert(key.to_string(), id.clone()) {
                if &previous != id {
                    warn!(
                        key,
                        kept = %id,
                        dropped = %previous,
                        "duplicate legacy key, keeping the last record"
                    );
                    index.duplicates.insert(key.to_string());
                }
            }
        }
        index
    }

    pub fn resolve(&self, key: &str) -> Option<&DocumentId> {
        self.by_key.get(key)
    }

    /// Every record carrying `key`, in scan order. A write filtered by key touches all of them.
    pub fn holders(&self, key: &str) -> &[DocumentId] {
        self.holders.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Keys that were claimed by more than one record.
    pub fn duplicates(&self) -> &BTreeSet<String> {
        &self.duplicates
    }
}

/// Legacy rows of the whole category collection together with their index.
#[derive(Debug, Clone, Default)]
pub struct CategoryKeyScan {
    pub rows: Vec<CategoryLinkRow>,
    pub index: KeyIndex,
}

impl CategoryKeyScan {
    /// Reads every category once, before any write of the calling phase.
    pub fn load(store: &dyn DocumentStore) -> store::Result<Self> {
        let documents = store.find(
            CATEGORY_COLLECTION,
            &Filter::All,
            &Projection::fields([KEY_FIELD, PARENT_KEY_FIELD, PARENT_ID_FIELD]),
        )?;
        let rows: Vec<CategoryLinkRow> = documents
            .iter()
            .filter_map(CategoryLinkRow::from_document)
            .collect();
        let index = KeyIndex::from_rows(&rows);
        info!(
            categories = rows.len(),
            keys = index.len(),
            duplicates = index.duplicates().len(),
            "category key index built"
        );
        Ok(Self { rows, index })
    }
}
