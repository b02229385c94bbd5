//! Idempotent category seeding entry points.

pub mod catalog;
pub mod salary;
pub mod tree;

pub use salary::{
    default_roster, load_roster, seed_salary_roles, SalarySeedOptions, SalarySeedReport, StaffRole,
};
pub use tree::{find_or_create, seed_tree, ChildSeed, RootSeed, SeedPlan, SeedReport};
