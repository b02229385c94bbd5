//! Resolves legacy `parentKey` references into canonical `parentId` links.
//!
//! The whole key space is indexed before the first write, so a single pass
//! resolves every level of the hierarchy without ordering parents first.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::domain::category::{
    CategoryLink, CategoryLinkRow, CATEGORY_COLLECTION, KEY_FIELD, PARENT_ID_FIELD,
};
use crate::domain::document::DocumentId;
use crate::store::{self, BulkWriteResult, DocumentStore, Filter, Update, UpdateOp};

use super::key_index::{CategoryKeyScan, KeyIndex};
use super::apply_in_batches;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentBackfillReport {
    pub scanned: usize,
    pub updated: usize,
    pub already_linked: usize,
    pub unresolved: usize,
    pub cycles_prevented: usize,
    pub duplicate_keys: usize,
}

/// Updates computed from one consistent read of the collection.
#[derive(Debug, Clone, Default)]
pub struct ParentBackfillPlan {
    pub ops: Vec<UpdateOp>,
    pub report: ParentBackfillReport,
}

/// Computes every parent link to write. Performs no I/O.
///
/// Each update is filtered by legacy key, so it re-parents every record holding
/// that key; the cycle guard therefore checks and records all of them together.
pub fn plan_parent_backfill(rows: &[CategoryLinkRow], index: &KeyIndex) -> ParentBackfillPlan {
    let mut report = ParentBackfillReport {
        scanned: rows.len(),
        duplicate_keys: index.duplicates().len(),
        ..ParentBackfillReport::default()
    };
    let mut parents: HashMap<DocumentId, DocumentId> = rows
        .iter()
        .filter_map(|row| row.parent_id.clone().map(|parent| (row.id.clone(), parent)))
        .collect();
    let hop_limit = rows.len() + 1;
    let mut ops = Vec::new();

    for row in rows {
        let (key, parent_key) = match &row.link {
            CategoryLink::Legacy {
                key,
                parent_key: Some(parent_key),
            } => (key.as_str(), parent_key.as_str()),
            CategoryLink::Legacy {
                parent_key: None, ..
            }
            | CategoryLink::Canonical => continue,
        };
        let Some(parent_id) = index.resolve(parent_key) else {
            debug!(key, parent_key, "parent key not in index, skipping");
            report.unresolved += 1;
            continue;
        };
        let holders = index.holders(key);
        if holders
            .iter()
            .all(|holder| parents.get(holder) == Some(parent_id))
        {
            report.already_linked += 1;
            continue;
        }
        if reaches_any(&parents, parent_id, holders, hop_limit) {
            warn!(key, parent_key, "parent link would form a cycle, skipping");
            report.cycles_prevented += 1;
            continue;
        }
        for holder in holders {
            parents.insert(holder.clone(), parent_id.clone());
        }
        ops.push(UpdateOp::many(
            Filter::eq(KEY_FIELD, key),
            Update::set(PARENT_ID_FIELD, parent_id),
        ));
    }

    ParentBackfillPlan { ops, report }
}

/// Whether following parent links from `start` arrives at any of `targets`.
fn reaches_any(
    parents: &HashMap<DocumentId, DocumentId>,
    start: &DocumentId,
    targets: &[DocumentId],
    hop_limit: usize,
) -> bool {
    let mut current = Some(start);
    for _ in 0..hop_limit {
        match current {
            Some(node) if targets.contains(node) => return true,
            Some(node) => current = parents.get(node),
            None => return false,
        }
    }
    // Existing data already loops; refuse to add to it.
    true
}

/// Scans the category collection and persists every resolvable parent link.
pub fn backfill_parent_ids(
    store: &dyn DocumentStore,
    batch_size: usize,
) -> store::Result<ParentBackfillReport> {
    info!("backfilling Category.parentId from parentKey");
    let scan = CategoryKeyScan::load(store)?;
    let ParentBackfillPlan { ops, mut report } = plan_parent_backfill(&scan.rows, &scan.index);
    let written: BulkWriteResult = apply_in_batches(store, CATEGORY_COLLECTION, &ops, batch_size)?;
    report.updated = written.modified;
    info!(
        updated = report.updated,
        already_linked = report.already_linked,
        unresolved = report.unresolved,
        cycles_prevented = report.cycles_prevented,
        "parent backfill finished"
    );
    Ok(report)
}
