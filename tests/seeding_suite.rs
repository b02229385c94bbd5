mod common;

use category_reconcile::domain::category::{LABEL_FIELD, PARENT_ID_FIELD, TYPE_FIELD};
use category_reconcile::domain::document::{str_field, DocumentId};
use category_reconcile::domain::CategoryType;
use category_reconcile::errors::ReconcileError;
use category_reconcile::reconcile::run_migration;
use category_reconcile::seed::{
    seed_salary_roles, seed_tree, SalarySeedOptions, SeedPlan, StaffRole,
};
use common::{assert_forest, assert_type_invariant, json_store, read_categories};

const TWO_LEVEL_PLAN: &str = r#"{
    "roots": [{ "slug": "ops", "label": "Operations", "type": "EXPENSE", "order": 1 }],
    "children": [{ "slug": "rent", "label": "Rent", "parentSlug": "ops", "order": 1 }]
}"#;

#[test]
fn seeding_twice_creates_each_node_once() {
    let (store, _guard) = json_store();
    let plan = SeedPlan::from_json(TWO_LEVEL_PLAN).expect("plan");

    let first = seed_tree(&store, &plan).expect("first run");
    assert_eq!((first.created, first.reused), (2, 0));

    let second = seed_tree(&store, &plan).expect("second run");
    assert_eq!((second.created, second.reused), (0, 2));
    assert_eq!(second.slugs, first.slugs);

    let categories = read_categories(&store);
    assert_eq!(categories.len(), 2);
    let rent = categories
        .iter()
        .find(|doc| str_field(doc, LABEL_FIELD) == Some("Rent"))
        .expect("rent");
    assert_eq!(
        str_field(rent, PARENT_ID_FIELD),
        first.slugs.get("ops").map(DocumentId::as_str)
    );
    assert_eq!(str_field(rent, TYPE_FIELD), Some("EXPENSE"));
}

#[test]
fn seeded_documents_carry_no_legacy_fields() {
    let (store, _guard) = json_store();
    seed_tree(&store, &SeedPlan::from_json(TWO_LEVEL_PLAN).expect("plan")).expect("seed");

    for doc in read_categories(&store) {
        assert!(!doc.contains_key("key"));
        assert!(!doc.contains_key("parentKey"));
        assert!(doc.contains_key("createdAt"));
    }
}

#[test]
fn unknown_parent_slug_is_a_config_error() {
    let (store, _guard) = json_store();
    let plan = SeedPlan::from_json(
        r#"{ "children": [{ "slug": "orphan", "label": "Orphan", "parentSlug": "nowhere" }] }"#,
    )
    .expect("plan");

    let report = seed_tree(&store, &plan).expect("seed");
    assert_eq!(report.config_errors, 1);
    assert_eq!(report.created, 0);
    assert!(read_categories(&store).is_empty());
}

#[test]
fn invalid_plan_is_rejected_before_any_write() {
    let (store, _guard) = json_store();
    let plan = SeedPlan::from_json(
        r#"{ "roots": [
            { "slug": "dup", "label": "One" },
            { "slug": "dup", "label": "Two" }
        ] }"#,
    )
    .expect("plan");

    let err = seed_tree(&store, &plan).unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidInput(_)));
    assert!(read_categories(&store).is_empty());
}

#[test]
fn default_catalog_is_idempotent() {
    let (store, _guard) = json_store();
    let plan = SeedPlan::default_catalog();

    let first = seed_tree(&store, &plan).expect("first run");
    assert_eq!(first.created, plan.len());
    assert_eq!(first.config_errors, 0);

    let second = seed_tree(&store, &plan).expect("second run");
    assert_eq!(second.created, 0);
    assert_eq!(second.reused, plan.len());

    let categories = read_categories(&store);
    assert_eq!(categories.len(), plan.len());
    assert_type_invariant(&categories);
    assert_forest(&categories);
}

#[test]
fn identical_salary_labels_collapse_into_one_child() {
    let (store, _guard) = json_store();
    let roles = [StaffRole::new("Engineer"), StaffRole::new("Engineer")];
    let options = SalarySeedOptions {
        parent_label: "Salary".into(),
        placeholder: "Unnamed".into(),
    };

    let report = seed_salary_roles(&store, &roles, &options).expect("seed salary");
    assert!(report.parent_created);
    assert_eq!(report.created, 1);

    let categories = read_categories(&store);
    let children: Vec<_> = categories
        .iter()
        .filter(|doc| str_field(doc, PARENT_ID_FIELD) == Some(report.parent_id.as_str()))
        .collect();
    assert_eq!(children.len(), 1);
    assert_eq!(str_field(children[0], LABEL_FIELD), Some("Engineer - Unnamed"));
}

#[test]
fn salary_seeding_merges_with_existing_children() {
    let (store, _guard) = json_store();
    let options = SalarySeedOptions::default();
    seed_salary_roles(&store, &[StaffRole::new("Designer")], &options).expect("first");

    let roles = [StaffRole::new("Designer"), StaffRole::new("Writer")];
    let report = seed_salary_roles(&store, &roles, &options).expect("second");
    assert!(!report.parent_created);
    assert_eq!((report.created, report.skipped), (1, 1));
    assert_eq!(read_categories(&store).len(), 3);
}

#[test]
fn seeded_tree_survives_migration_unchanged() {
    let (store, _guard) = json_store();
    seed_tree(&store, &SeedPlan::default_catalog()).expect("seed");
    let before = read_categories(&store);

    let report = run_migration(&store, CategoryType::Expense, 500).expect("migrate");
    assert_eq!(report.total_updates(), 0);
    assert_eq!(read_categories(&store), before);
}
