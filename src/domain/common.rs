//! Shared traits for reconciliation entities.

/// Provides read-only access to an entity's display label.
pub trait NamedEntity {
    fn label(&self) -> &str;
}
