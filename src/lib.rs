#![doc(test(attr(deny(warnings))))]

//! Category Reconcile migrates a tree-structured category taxonomy from
//! legacy key-based parent references to canonical id-based links, backfills
//! transactions that still reference categories by key, and seeds category
//! trees idempotently against a schemaless document store.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod reconcile;
pub mod seed;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Category Reconcile tracing initialized.");
    });
}
