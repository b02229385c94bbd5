//! Operator command line for the reconciliation and seeding jobs.

pub mod jobs;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, ConfigManager};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::store::JsonDocumentStore;

use self::output::OutputPreferences;

#[derive(Debug, Parser)]
#[command(name = "category_reconcile")]
#[command(about = "Idempotent category hierarchy migration and seeding jobs")]
#[command(version)]
pub struct Cli {
    /// Directory of the JSON document store
    #[arg(long, global = true)]
    pub store_root: Option<PathBuf>,

    /// Configuration file (defaults to $CATEGORY_RECONCILE_HOME/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Repair categories with a missing or unknown type
    NormalizeTypes,

    /// Resolve legacy parentKey references into parentId
    BackfillParents,

    /// Link transactions to categories through their legacy category key
    BackfillTransactions,

    /// Run normalize-types, backfill-parents and backfill-transactions in order
    Migrate,

    /// Create missing nodes of a category tree
    SeedCategories {
        /// JSON seed plan; the built-in catalog is used when omitted
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Merge one salary category per staff role
    SeedSalary {
        /// JSON array of staff roles; the built-in roster is used when omitted
        #[arg(long)]
        roster: Option<PathBuf>,
    },

    /// Print the effective configuration
    ShowConfig,
}

/// Loads configuration, opens the store, and runs the selected job.
pub fn run(cli: Cli) -> ReconcileResult<()> {
    output::set_preferences(OutputPreferences {
        plain_output: cli.plain,
        quiet_mode: cli.quiet,
    });

    let manager = match &cli.config {
        Some(path) => ConfigManager::new(path.clone()),
        None => ConfigManager::from_env(),
    };
    let mut config = manager.load()?;
    if let Some(root) = cli.store_root {
        config.store_root = Some(root);
    }
    let store_root = config.resolve_store_root(manager.base_dir());

    if let Command::ShowConfig = cli.command {
        return show_config(&config, &store_root);
    }

    tracing::info!(store = %store_root.display(), "opening document store");
    let store = JsonDocumentStore::open(&store_root)?;

    match cli.command {
        Command::NormalizeTypes => jobs::normalize_types(&store, &config),
        Command::BackfillParents => jobs::backfill_parents(&store, &config),
        Command::BackfillTransactions => jobs::backfill_transactions(&store, &config),
        Command::Migrate => jobs::migrate(&store, &config),
        Command::SeedCategories { plan } => jobs::seed_categories(&store, &config, plan.as_deref()),
        Command::SeedSalary { roster } => jobs::seed_salary(&store, &config, roster.as_deref()),
        Command::ShowConfig => Ok(()),
    }
}

/// Parses process arguments and runs the job.
pub fn run_cli() -> ReconcileResult<()> {
    run(Cli::parse())
}

fn show_config(config: &Config, store_root: &std::path::Path) -> ReconcileResult<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|err| ReconcileError::InvalidInput(err.to_string()))?;
    output::info(format!("store: {}", store_root.display()));
    println!("{json}");
    Ok(())
}
