//! Migration phases moving the category tree from legacy keys to canonical ids.
//!
//! Every phase is idempotent and safe to re-run alone; [`run_migration`]
//! chains them in the order the data dependencies require.

pub mod key_index;
pub mod leaf_backfill;
pub mod parent_backfill;
pub mod type_normalizer;

use tracing::info;

use crate::domain::CategoryType;
use crate::store::{self, BulkWriteResult, DocumentStore, UpdateOp};

pub use key_index::{CategoryKeyScan, KeyIndex};
pub use leaf_backfill::{backfill_transaction_category_ids, LeafBackfillReport};
pub use parent_backfill::{backfill_parent_ids, ParentBackfillReport};
pub use type_normalizer::{normalize_types, NormalizeReport};

/// Summary of a full migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub types: NormalizeReport,
    pub parents: ParentBackfillReport,
    pub transactions: LeafBackfillReport,
}

impl MigrationReport {
    /// Total documents changed by the run; zero once the store has converged.
    pub fn total_updates(&self) -> usize {
        self.types.repaired + self.parents.updated + self.transactions.updated
    }
}

/// Normalizes types, backfills parent ids, then backfills transaction category ids.
pub fn run_migration(
    store: &dyn DocumentStore,
    default_type: CategoryType,
    batch_size: usize,
) -> store::Result<MigrationReport> {
    info!("starting category migration");
    let types = normalize_types(store, default_type)?;
    let parents = backfill_parent_ids(store, batch_size)?;
    let transactions = backfill_transaction_category_ids(store, batch_size)?;
    let report = MigrationReport {
        types,
        parents,
        transactions,
    };
    info!(total_updates = report.total_updates(), "category migration done");
    Ok(report)
}

/// Submits a fully planned set of updates in fixed-size batches.
pub(crate) fn apply_in_batches(
    store: &dyn DocumentStore,
    collection: &str,
    ops: &[UpdateOp],
    batch_size: usize,
) -> store::Result<BulkWriteResult> {
    let mut total = BulkWriteResult::default();
    for chunk in ops.chunks(batch_size.max(1)) {
        total.merge(store.bulk_update(collection, chunk)?);
    }
    Ok(total)
}
