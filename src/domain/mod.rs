//! Category and transaction models plus the raw document representation.

pub mod category;
pub mod common;
pub mod document;
pub mod transaction;

pub use category::{Category, CategoryLink, CategoryLinkRow, CategoryType, NewCategory};
pub use common::NamedEntity;
pub use document::{Document, DocumentId};
pub use transaction::TransactionLink;
