//! Merges one child category per staff role under the salary root.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, DEFAULT_UNNAMED_PLACEHOLDER};
use crate::domain::category::{
    NewCategory, CATEGORY_COLLECTION, LABEL_FIELD, PARENT_ID_FIELD, TYPE_FIELD,
};
use crate::domain::document::DocumentId;
use crate::domain::{Category, CategoryType, NamedEntity};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::store::{DocumentStore, Filter, Projection};

use super::tree::find_or_create;

/// A position on the staff roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StaffRole {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_by_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_by_ar: Option<String>,
}

impl StaffRole {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Name sources in priority order; blank values fall through to the next one.
    pub fn display_name<'a>(&'a self, placeholder: &'a str) -> &'a str {
        [self.filled_by_en.as_deref(), self.filled_by_ar.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(placeholder)
    }

    /// `"<title> - <name>"`, trimmed.
    pub fn category_label(&self, placeholder: &str) -> String {
        let placeholder = match placeholder.trim() {
            "" => DEFAULT_UNNAMED_PLACEHOLDER,
            trimmed => trimmed,
        };
        format!("{} - {}", self.title.trim(), self.display_name(placeholder))
            .trim()
            .to_string()
    }
}

/// The roster used when no roster file is configured.
pub fn default_roster() -> Vec<StaffRole> {
    vec![StaffRole {
        title: "Chief Executive Officer".into(),
        filled_by_en: Some("CEO".into()),
        filled_by_ar: Some("الرئيس التنفيذي".into()),
    }]
}

pub fn load_roster(path: &Path) -> ReconcileResult<Vec<StaffRole>> {
    let data = fs::read_to_string(path).map_err(|err| {
        ReconcileError::InvalidInput(format!("salary roster `{}`: {err}", path.display()))
    })?;
    serde_json::from_str(&data)
        .map_err(|err| ReconcileError::InvalidInput(format!("salary roster: {err}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalarySeedOptions {
    pub parent_label: String,
    pub placeholder: String,
}

impl Default for SalarySeedOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SalarySeedOptions {
    fn from(config: &Config) -> Self {
        Self {
            parent_label: config.salary_label.clone(),
            placeholder: config.unnamed_placeholder.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalarySeedReport {
    pub parent_id: DocumentId,
    pub parent_created: bool,
    pub created: usize,
    pub skipped: usize,
}

/// Distinct child labels for a roster; identical labels collapse into one.
pub fn desired_labels(roles: &[StaffRole], placeholder: &str) -> BTreeSet<String> {
    roles
        .iter()
        .map(|role| role.category_label(placeholder))
        .collect()
}

/// Trimmed labels of the expense children already under `parent_id`, read once.
pub fn existing_child_labels(
    store: &dyn DocumentStore,
    parent_id: &DocumentId,
) -> ReconcileResult<BTreeSet<String>> {
    let documents = store.find(
        CATEGORY_COLLECTION,
        &Filter::and([
            Filter::eq(TYPE_FIELD, CategoryType::Expense),
            Filter::eq(PARENT_ID_FIELD, parent_id),
        ]),
        &Projection::fields([LABEL_FIELD, TYPE_FIELD, PARENT_ID_FIELD]),
    )?;
    let children: Vec<Category> = documents.iter().filter_map(Category::from_document).collect();
    Ok(children
        .iter()
        .map(|category| category.label().trim())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect())
}

/// Finds or creates the salary root, then creates only the missing role children.
pub fn seed_salary_roles(
    store: &dyn DocumentStore,
    roles: &[StaffRole],
    options: &SalarySeedOptions,
) -> ReconcileResult<SalarySeedReport> {
    info!(roles = roles.len(), "seeding salary categories");
    let root = NewCategory::root(options.parent_label.clone(), CategoryType::Expense, 0);
    let (parent_id, parent_created) = find_or_create(store, &root)?;
    if parent_created {
        info!(%parent_id, "created salary parent");
    } else {
        info!(%parent_id, "salary parent exists");
    }

    let desired = desired_labels(roles, &options.placeholder);
    let existing = existing_child_labels(store, &parent_id)?;

    let mut created = 0;
    let mut skipped = 0;
    for label in desired {
        if existing.contains(&label) {
            skipped += 1;
            continue;
        }
        let child = NewCategory::child(label, CategoryType::Expense, parent_id.clone(), 0);
        store.insert(CATEGORY_COLLECTION, child.to_document())?;
        created += 1;
    }

    info!(created, skipped, "salary categories seeded");
    Ok(SalarySeedReport {
        parent_id,
        parent_created,
        created,
        skipped,
    })
}
