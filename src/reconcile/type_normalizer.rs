//! Repairs categories whose `type` discriminant is missing or unknown.

use tracing::info;

use crate::domain::category::{CategoryType, CATEGORY_COLLECTION, TYPE_FIELD};
use crate::store::{self, DocumentStore, Filter, Update, UpdateOp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub repaired: usize,
}

/// Filter selecting every category with an absent or invalid type.
pub fn invalid_type_filter() -> Filter {
    Filter::or([
        Filter::missing(TYPE_FIELD),
        Filter::none_of(TYPE_FIELD, CategoryType::ALL.map(CategoryType::as_str)),
    ])
}

/// Sets `default_type` on every category failing the type invariant. A no-op once converged.
pub fn normalize_types(
    store: &dyn DocumentStore,
    default_type: CategoryType,
) -> store::Result<NormalizeReport> {
    info!(default = %default_type, "normalizing category types");
    let op = UpdateOp::many(invalid_type_filter(), Update::set(TYPE_FIELD, default_type));
    let result = store.bulk_update(CATEGORY_COLLECTION, &[op])?;
    info!(repaired = result.modified, "category types normalized");
    Ok(NormalizeReport {
        repaired: result.modified,
    })
}
