use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Error type that captures run-aborting reconciliation failures.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ReconcileError {
    /// Whether the failure should abort a batch rather than skip a single record.
    pub fn is_fatal(&self) -> bool {
        match self {
            ReconcileError::Store(err) => err.is_fatal(),
            ReconcileError::Config(_) | ReconcileError::InvalidInput(_) => true,
        }
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
