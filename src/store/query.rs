//! Typed filters, updates, and projections understood by every store driver.

use serde_json::Value;

use crate::domain::document::{is_null_or_missing, Document, ID_FIELD};

use super::{Result, StoreError};

/// Predicate over a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    Exists(String, bool),
    IsNullOrMissing(String),
    NonEmptyString(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn one_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn none_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::NotIn(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), true)
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), false)
    }

    pub fn null_or_missing(field: impl Into<String>) -> Self {
        Filter::IsNullOrMissing(field.into())
    }

    pub fn non_empty_string(field: impl Into<String>) -> Self {
        Filter::NonEmptyString(field.into())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Rejects filters a driver could not evaluate unambiguously.
    pub fn validate(&self) -> Result<()> {
        match self {
            Filter::All => Ok(()),
            Filter::Eq(field, _)
            | Filter::Ne(field, _)
            | Filter::IsNullOrMissing(field)
            | Filter::NonEmptyString(field) => check_field(field),
            Filter::Exists(field, present) => {
                check_field(field)?;
                if field == ID_FIELD && !present {
                    return Err(StoreError::InvalidQuery(
                        "stored documents always carry an id".into(),
                    ));
                }
                Ok(())
            }
            Filter::In(field, values) | Filter::NotIn(field, values) => {
                check_field(field)?;
                if values.is_empty() {
                    return Err(StoreError::InvalidQuery(format!(
                        "membership test on `{field}` needs at least one value"
                    )));
                }
                Ok(())
            }
            Filter::And(filters) | Filter::Or(filters) => {
                if filters.is_empty() {
                    return Err(StoreError::InvalidQuery(
                        "logical filter needs at least one clause".into(),
                    ));
                }
                filters.iter().try_for_each(Filter::validate)
            }
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => document.get(field) == Some(value),
            Filter::Ne(field, value) => document.get(field) != Some(value),
            Filter::In(field, values) => document
                .get(field)
                .map_or(false, |current| values.contains(current)),
            // Missing fields are "not in" any list, like the document stores we target.
            Filter::NotIn(field, values) => document
                .get(field)
                .map_or(true, |current| !values.contains(current)),
            Filter::Exists(field, present) => document.contains_key(field) == *present,
            Filter::IsNullOrMissing(field) => is_null_or_missing(document, field),
            Filter::NonEmptyString(field) => document
                .get(field)
                .and_then(Value::as_str)
                .map_or(false, |value| !value.is_empty()),
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(document)),
        }
    }
}

/// Ordered `$set` assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    assignments: Vec<(String, Value)>,
}

impl Update {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_set(field, value)
    }

    pub fn and_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((field.into(), value.into()));
        self
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    pub fn validate(&self) -> Result<()> {
        if self.assignments.is_empty() {
            return Err(StoreError::InvalidQuery("update sets no fields".into()));
        }
        for (field, _) in &self.assignments {
            check_field(field)?;
            if field == ID_FIELD {
                return Err(StoreError::InvalidQuery(
                    "canonical ids are immutable".into(),
                ));
            }
        }
        Ok(())
    }

    /// Applies the assignments, returning whether the document changed.
    pub fn apply(&self, document: &mut Document) -> bool {
        let mut changed = false;
        for (field, value) in &self.assignments {
            if document.get(field) != Some(value) {
                document.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Fields returned by `find`. The id is always included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Projection {
    pub fn fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn apply(&self, document: &Document) -> Document {
        match self {
            Projection::All => document.clone(),
            Projection::Fields(fields) => document
                .iter()
                .filter(|(name, _)| name.as_str() == ID_FIELD || fields.iter().any(|f| f == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// One entry of a bulk update request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOp {
    pub filter: Filter,
    pub update: Update,
    pub multi: bool,
}

impl UpdateOp {
    pub fn one(filter: Filter, update: Update) -> Self {
        Self {
            filter,
            update,
            multi: false,
        }
    }

    pub fn many(filter: Filter, update: Update) -> Self {
        Self {
            filter,
            update,
            multi: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.update.validate()
    }
}

/// Outcome of a bulk update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub matched: usize,
    pub modified: usize,
}

impl BulkWriteResult {
    pub fn merge(&mut self, other: BulkWriteResult) {
        self.matched += other.matched;
        self.modified += other.modified;
    }
}

fn check_field(field: &str) -> Result<()> {
    if field.trim().is_empty() {
        Err(StoreError::InvalidQuery("field name must not be empty".into()))
    } else {
        Ok(())
    }
}

/// Applies a validated batch to an in-memory collection. Shared by the drivers.
pub(crate) fn apply_bulk(documents: &mut [Document], ops: &[UpdateOp]) -> BulkWriteResult {
    let mut result = BulkWriteResult::default();
    for op in ops {
        for document in documents.iter_mut() {
            if !op.filter.matches(document) {
                continue;
            }
            result.matched += 1;
            if op.update.apply(document) {
                result.modified += 1;
            }
            if !op.multi {
                break;
            }
        }
    }
    result
}
