//! Declarative, idempotent creation of category trees.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::category::{
    NewCategory, CATEGORY_COLLECTION, LABEL_FIELD, PARENT_ID_FIELD, TYPE_FIELD,
};
use crate::domain::document::DocumentId;
use crate::domain::CategoryType;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::store::{self, DocumentStore, Filter, Projection, StoreError};

/// A top-level node addressed by slug within one plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootSeed {
    pub slug: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: CategoryType,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChildSeed {
    pub slug: String,
    pub label: String,
    pub parent_slug: String,
    #[serde(rename = "type", default)]
    pub kind: CategoryType,
    #[serde(default)]
    pub order: i64,
}

/// Desired roots and children. Roots are always resolved before children.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedPlan {
    #[serde(default)]
    pub roots: Vec<RootSeed>,
    #[serde(default)]
    pub children: Vec<ChildSeed>,
}

impl SeedPlan {
    pub fn from_json(json: &str) -> ReconcileResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| ReconcileError::InvalidInput(format!("seed plan: {err}")))
    }

    pub fn load(path: &Path) -> ReconcileResult<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            ReconcileError::InvalidInput(format!("seed plan `{}`: {err}", path.display()))
        })?;
        Self::from_json(&data)
    }

    /// Problems that make the plan ambiguous. Children with unknown parents are
    /// reported at seed time instead, since they only skip one node.
    pub fn validate(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut problems = Vec::new();
        let slugs = self
            .roots
            .iter()
            .map(|root| (&root.slug, &root.label))
            .chain(self.children.iter().map(|child| (&child.slug, &child.label)));
        for (slug, label) in slugs {
            if slug.trim().is_empty() {
                problems.push(format!("node `{label}` has an empty slug"));
            } else if !seen.insert(slug.as_str()) {
                problems.push(format!("slug `{slug}` is declared more than once"));
            }
            if label.trim().is_empty() {
                problems.push(format!("node `{slug}` has an empty label"));
            }
        }
        problems
    }

    pub fn len(&self) -> usize {
        self.roots.len() + self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub reused: usize,
    pub config_errors: usize,
    pub failed: usize,
    /// Canonical id resolved for every seeded slug.
    pub slugs: BTreeMap<String, DocumentId>,
}

/// Filter matching the semantic identity `(label, type, parentId)`.
pub fn identity_filter(
    label: &str,
    kind: CategoryType,
    parent_id: Option<&DocumentId>,
) -> Filter {
    let parent = match parent_id {
        Some(id) => Filter::eq(PARENT_ID_FIELD, id),
        None => Filter::null_or_missing(PARENT_ID_FIELD),
    };
    Filter::and([
        Filter::eq(LABEL_FIELD, label),
        Filter::eq(TYPE_FIELD, kind),
        parent,
    ])
}

/// Returns the id of the node matching `node`'s identity, inserting it when absent.
/// The boolean is `true` when a new document was created.
pub fn find_or_create(
    store: &dyn DocumentStore,
    node: &NewCategory,
) -> store::Result<(DocumentId, bool)> {
    let existing = store.find(
        CATEGORY_COLLECTION,
        &identity_filter(&node.label, node.kind, node.parent_id.as_ref()),
        &Projection::fields([LABEL_FIELD]),
    )?;
    if let Some(id) = existing.iter().find_map(DocumentId::of) {
        return Ok((id, false));
    }
    let id = store.insert(CATEGORY_COLLECTION, node.to_document())?;
    Ok((id, true))
}

/// Seeds `plan` so that re-running it never produces duplicate siblings.
pub fn seed_tree(store: &dyn DocumentStore, plan: &SeedPlan) -> ReconcileResult<SeedReport> {
    let problems = plan.validate();
    if !problems.is_empty() {
        for problem in &problems {
            error!(%problem, "seed plan problem");
        }
        return Err(ReconcileError::InvalidInput(problems.join("; ")));
    }

    info!(roots = plan.roots.len(), children = plan.children.len(), "seeding categories");
    let mut report = SeedReport::default();

    for root in &plan.roots {
        let node = NewCategory::root(root.label.clone(), root.kind, root.order);
        match find_or_create(store, &node) {
            Ok((id, created)) => {
                record(&mut report, created, &root.slug, &root.label);
                report.slugs.insert(root.slug.clone(), id);
            }
            Err(err) => handle_failure(&mut report, &root.slug, err)?,
        }
    }

    for child in &plan.children {
        let Some(parent_id) = report.slugs.get(&child.parent_slug).cloned() else {
            error!(
                slug = %child.slug,
                parent_slug = %child.parent_slug,
                "parent category not found, skipping"
            );
            report.config_errors += 1;
            continue;
        };
        let node = NewCategory::child(child.label.clone(), child.kind, parent_id, child.order);
        match find_or_create(store, &node) {
            Ok((id, created)) => {
                record(&mut report, created, &child.slug, &child.label);
                report.slugs.insert(child.slug.clone(), id);
            }
            Err(err) => handle_failure(&mut report, &child.slug, err)?,
        }
    }

    info!(
        created = report.created,
        reused = report.reused,
        config_errors = report.config_errors,
        failed = report.failed,
        "category seeding finished"
    );
    Ok(report)
}

fn record(report: &mut SeedReport, created: bool, slug: &str, label: &str) {
    if created {
        info!(slug, label, "created category");
        report.created += 1;
    } else {
        info!(slug, "category already exists, skipping");
        report.reused += 1;
    }
}

/// Connectivity failures abort the run; anything else only costs this node.
fn handle_failure(report: &mut SeedReport, slug: &str, err: StoreError) -> ReconcileResult<()> {
    if err.is_fatal() {
        return Err(err.into());
    }
    error!(slug, error = %err, "error creating category");
    report.failed += 1;
    Ok(())
}
