//! In-memory document source.
//!
//! Evaluates equality/membership conditions, field projections, and
//! multi-key sorts over a fixed row set. Rows are immutable after
//! construction; queries clone what they return.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Record, SortKey, SortOrder};
use crate::ports::{DocumentSource, SourceError, SourceQuery};

/// Queryable in-memory collection.
pub struct MemorySource {
    identity_field: String,
    rows: Vec<Record>,
}

impl MemorySource {
    /// New source over the given rows, keyed on `_id`.
    pub fn new(rows: Vec<Record>) -> Self {
        Self {
            identity_field: "_id".to_string(),
            rows,
        }
    }

    /// Fixture constructor taking raw JSON rows.
    ///
    /// # Panics
    ///
    /// Panics if a row is not a JSON object.
    pub fn from_values(rows: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| Record::try_from(row).expect("memory source rows are JSON objects"))
                .collect(),
        )
    }

    /// Use a different identity field.
    pub fn with_identity_field(mut self, identity_field: impl Into<String>) -> Self {
        self.identity_field = identity_field.into();
        self
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn identity_field(&self) -> &str {
        &self.identity_field
    }

    async fn query(&self, query: &SourceQuery) -> Result<Vec<Record>, SourceError> {
        let mut rows: Vec<Record> = self
            .rows
            .iter()
            .filter(|row| query.condition.matches(row))
            .cloned()
            .collect();

        // Sort before projecting: sort keys need not survive the
        // projection.
        if let Some(sort) = &query.sort {
            rows.sort_by(|a, b| compare_rows(a, b, sort));
        }

        Ok(rows
            .into_iter()
            .map(|row| row.project(&query.projection))
            .collect())
    }
}

fn compare_rows(a: &Record, b: &Record, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let left = a.get(key.field()).unwrap_or(&Value::Null);
        let right = b.get(key.field()).unwrap_or(&Value::Null);

        let ordering = match key.order() {
            SortOrder::Asc => compare_values(left, right),
            SortOrder::Desc => compare_values(right, left),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Total order over JSON values: null < booleans < numbers < strings <
/// arrays < objects, with lexicographic comparison inside each kind.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (left, right) in a.iter().zip(b) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Source that fails every query. Fault injection for tests and demos.
pub struct FailingSource {
    message: String,
}

impl FailingSource {
    /// New failing source reporting the given backend message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for FailingSource {
    async fn query(&self, _query: &SourceQuery) -> Result<Vec<Record>, SourceError> {
        Err(SourceError::Backend(self.message.clone()))
    }
}
