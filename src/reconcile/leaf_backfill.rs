//! Links transactions to canonical categories through their legacy `category` string.

use tracing::{debug, info};

use crate::domain::category::{CATEGORY_COLLECTION, KEY_FIELD};
use crate::domain::document::{non_empty_str, DocumentId, ID_FIELD};
use crate::domain::transaction::{
    TransactionLink, CATEGORY_FIELD, CATEGORY_ID_FIELD, TRANSACTION_COLLECTION,
};
use crate::store::{self, DocumentStore, Filter, Projection, Update, UpdateOp};

use super::apply_in_batches;
use super::key_index::KeyIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafBackfillReport {
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Transactions still waiting for a canonical link. Linked ones never enter the scan.
pub fn pending_transactions_filter() -> Filter {
    Filter::and([
        Filter::non_empty_string(CATEGORY_FIELD),
        Filter::null_or_missing(CATEGORY_ID_FIELD),
    ])
}

/// Builds the key index the leaf backfill resolves against.
pub fn load_category_index(store: &dyn DocumentStore) -> store::Result<KeyIndex> {
    let documents = store.find(
        CATEGORY_COLLECTION,
        &Filter::non_empty_string(KEY_FIELD),
        &Projection::fields([KEY_FIELD]),
    )?;
    let pairs: Vec<(String, DocumentId)> = documents
        .iter()
        .filter_map(|document| {
            let id = DocumentId::of(document)?;
            let key = non_empty_str(document, KEY_FIELD)?;
            Some((key.to_string(), id))
        })
        .collect();
    Ok(KeyIndex::from_pairs(
        pairs.iter().map(|(key, id)| (key.as_str(), id)),
    ))
}

/// Plans guarded single-document updates; returns them with the number of misses.
pub fn plan_leaf_backfill(
    transactions: &[TransactionLink],
    index: &KeyIndex,
) -> (Vec<UpdateOp>, usize) {
    let mut ops = Vec::new();
    let mut skipped = 0;
    for txn in transactions.iter().filter(|txn| txn.needs_backfill()) {
        let category = txn.category.as_deref().unwrap_or_default();
        match index.resolve(category) {
            Some(category_id) => ops.push(UpdateOp::one(
                Filter::and([
                    Filter::eq(ID_FIELD, &txn.id),
                    Filter::null_or_missing(CATEGORY_ID_FIELD),
                ]),
                Update::set(CATEGORY_ID_FIELD, category_id),
            )),
            None => {
                debug!(transaction = %txn.id, category, "category key not found, skipping");
                skipped += 1;
            }
        }
    }
    (ops, skipped)
}

/// Backfills `Transaction.categoryId` without ever overwriting an existing link.
pub fn backfill_transaction_category_ids(
    store: &dyn DocumentStore,
    batch_size: usize,
) -> store::Result<LeafBackfillReport> {
    info!("backfilling Transaction.categoryId from Transaction.category");
    let index = load_category_index(store)?;
    let documents = store.find(
        TRANSACTION_COLLECTION,
        &pending_transactions_filter(),
        &Projection::fields([CATEGORY_FIELD]),
    )?;
    let transactions: Vec<TransactionLink> = documents
        .iter()
        .filter_map(TransactionLink::from_document)
        .collect();
    let (ops, skipped) = plan_leaf_backfill(&transactions, &index);
    let written = apply_in_batches(store, TRANSACTION_COLLECTION, &ops, batch_size)?;
    let report = LeafBackfillReport {
        scanned: transactions.len(),
        updated: written.modified,
        skipped,
    };
    info!(
        updated = report.updated,
        skipped = report.skipped,
        "transaction backfill finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .load_json(
                CATEGORY_COLLECTION,
                &json!([{ "id": "c1", "key": "infra", "type": "EXPENSE" }]).to_string(),
            )
            .expect("categories");
        store
            .load_json(
                TRANSACTION_COLLECTION,
                &json!([
                    { "id": "t1", "category": "infra", "amount": 10 },
                    { "id": "t2", "category": "unknown-key" },
                    { "id": "t3", "category": "infra", "categoryId": "keep" },
                    { "id": "t4", "category": "" }
                ])
                .to_string(),
            )
            .expect("transactions");
        store
    }

    #[test]
    fn resolves_known_keys_and_skips_the_rest() {
        let store = store();
        let report = backfill_transaction_category_ids(&store, 100).expect("backfill");
        assert_eq!(
            report,
            LeafBackfillReport {
                scanned: 2,
                updated: 1,
                skipped: 1
            }
        );
        let t1 = store
            .get(TRANSACTION_COLLECTION, &DocumentId::new("t1"))
            .expect("t1");
        assert_eq!(t1.get(CATEGORY_ID_FIELD), Some(&json!("c1")));
        assert_eq!(t1.get("amount"), Some(&json!(10)));
        let t3 = store
            .get(TRANSACTION_COLLECTION, &DocumentId::new("t3"))
            .expect("t3");
        assert_eq!(t3.get(CATEGORY_ID_FIELD), Some(&json!("keep")));
    }

    #[test]
    fn second_run_only_revisits_unresolvable_rows() {
        let store = store();
        backfill_transaction_category_ids(&store, 100).expect("first");
        let report = backfill_transaction_category_ids(&store, 100).expect("second");
        assert_eq!(report.updated, 0);
        assert_eq!(report.scanned, 1);
        assert_eq!(report.skipped, 1);
    }
}
