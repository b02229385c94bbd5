//! Schemaless document values exchanged with the store.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field holding the store-assigned canonical identifier.
pub const ID_FIELD: &str = "id";

/// A raw document as persisted by the store.
pub type Document = Map<String, Value>;

/// Canonical identifier generated by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh identifier in the compact hex form used by the drivers.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the identifier of a stored document, if it carries a usable one.
    pub fn of(document: &Document) -> Option<Self> {
        non_empty_str(document, ID_FIELD).map(Self::new)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::String(id.0)
    }
}

impl From<&DocumentId> for Value {
    fn from(id: &DocumentId) -> Self {
        Value::String(id.0.clone())
    }
}

/// Returns the string stored under `field`, ignoring non-string values.
pub fn str_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}

/// Like [`str_field`] but treats empty strings as absent.
pub fn non_empty_str<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    str_field(document, field).filter(|value| !value.is_empty())
}

/// Returns `true` when the field is missing or explicitly `null`.
pub fn is_null_or_missing(document: &Document, field: &str) -> bool {
    matches!(document.get(field), None | Some(Value::Null))
}
