//! Batch job handlers. Each one prints a single summary line per phase.

use std::path::Path;

use crate::config::Config;
use crate::errors::ReconcileResult;
use crate::reconcile::{
    self, LeafBackfillReport, MigrationReport, NormalizeReport, ParentBackfillReport,
};
use crate::seed::{self, SalarySeedOptions, SalarySeedReport, SeedPlan, SeedReport};
use crate::store::DocumentStore;

use super::output;

pub fn normalize_types(store: &dyn DocumentStore, config: &Config) -> ReconcileResult<()> {
    output::section("Normalizing Category.type");
    let report = reconcile::normalize_types(store, config.default_type)?;
    output::success(format_normalize(&report));
    Ok(())
}

pub fn backfill_parents(store: &dyn DocumentStore, config: &Config) -> ReconcileResult<()> {
    output::section("Backfilling Category.parentId from parentKey");
    let report = reconcile::backfill_parent_ids(store, config.effective_batch_size())?;
    if report.duplicate_keys > 0 {
        output::warning(format!(
            "{} legacy key(s) are shared by several categories; the last record won",
            report.duplicate_keys
        ));
    }
    output::success(format_parents(&report));
    Ok(())
}

pub fn backfill_transactions(store: &dyn DocumentStore, config: &Config) -> ReconcileResult<()> {
    output::section("Backfilling Transaction.categoryId from Transaction.category");
    let report =
        reconcile::backfill_transaction_category_ids(store, config.effective_batch_size())?;
    output::success(format_transactions(&report));
    Ok(())
}

pub fn migrate(store: &dyn DocumentStore, config: &Config) -> ReconcileResult<()> {
    output::section("Starting Category migration");
    let report: MigrationReport =
        reconcile::run_migration(store, config.default_type, config.effective_batch_size())?;
    output::success(format_normalize(&report.types));
    output::success(format_parents(&report.parents));
    output::success(format_transactions(&report.transactions));
    output::success(format!("migrate: total_updates={}", report.total_updates()));
    Ok(())
}

pub fn seed_categories(
    store: &dyn DocumentStore,
    config: &Config,
    plan_path: Option<&Path>,
) -> ReconcileResult<()> {
    let plan = match plan_path.or(config.seed_plan.as_deref()) {
        Some(path) => SeedPlan::load(path)?,
        None => SeedPlan::default_catalog(),
    };
    output::section(format!("Seeding {} categories", plan.len()));
    let report = seed::seed_tree(store, &plan)?;
    if report.config_errors > 0 || report.failed > 0 {
        output::warning("some categories were skipped; see the log for details");
    }
    output::success(format_seed(&report));
    Ok(())
}

pub fn seed_salary(
    store: &dyn DocumentStore,
    config: &Config,
    roster_path: Option<&Path>,
) -> ReconcileResult<()> {
    let roles = match roster_path.or(config.salary_roster.as_deref()) {
        Some(path) => seed::load_roster(path)?,
        None => seed::default_roster(),
    };
    output::section("Seeding Salary categories (2 levels)");
    let report = seed::seed_salary_roles(store, &roles, &SalarySeedOptions::from(config))?;
    output::success(format_salary(&report));
    Ok(())
}

pub fn format_normalize(report: &NormalizeReport) -> String {
    format!("normalize-types: repaired={}", report.repaired)
}

pub fn format_parents(report: &ParentBackfillReport) -> String {
    format!(
        "backfill-parents: updated={} already_linked={} unresolved={} cycles_prevented={} duplicate_keys={}",
        report.updated,
        report.already_linked,
        report.unresolved,
        report.cycles_prevented,
        report.duplicate_keys
    )
}

pub fn format_transactions(report: &LeafBackfillReport) -> String {
    format!(
        "backfill-transactions: updated={} skipped={}",
        report.updated, report.skipped
    )
}

pub fn format_seed(report: &SeedReport) -> String {
    format!(
        "seed-categories: created={} reused={} config_errors={} failed={}",
        report.created, report.reused, report.config_errors, report.failed
    )
}

pub fn format_salary(report: &SalarySeedReport) -> String {
    format!(
        "seed-salary: parent={} parent_created={} created={} skipped={}",
        report.parent_id, report.parent_created, report.created, report.skipped
    )
}
