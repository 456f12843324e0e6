//! Records and the identity-keyed merge accumulator.
//!
//! The merge accumulator carries the defining invariant of the engine: the
//! final result set of a collection container is keyed by record identity,
//! not by selector. It holds the union of all identities touched by any
//! accumulated selector, and each record carries the union of all fields
//! any selector requested for it, with later merges winning per field.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::json_kind;
use super::selector::Projection;

/// A fetched row: a mapping from field name to JSON value, carrying the
/// backing source's identity field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Canonical merge key for this record, if the identity field is
    /// present.
    pub fn identity(&self, identity_field: &str) -> Option<RecordId> {
        self.get(identity_field).map(RecordId::from_value)
    }

    /// Copy of this record restricted to a projection.
    pub fn project(&self, projection: &Projection) -> Record {
        match projection {
            Projection::All => self.clone(),
            Projection::Fields(_) => Record(
                self.0
                    .iter()
                    .filter(|(field, _)| projection.keeps(field))
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect(),
            ),
        }
    }

    /// Overlay another record's fields onto this one; the other record
    /// wins on field collision.
    pub fn overlay(&mut self, other: Record) {
        for (field, value) in other.0 {
            self.0.insert(field, value);
        }
    }

    /// The record as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Record(fields)),
            other => Err(RecordShapeError {
                kind: json_kind(&other),
            }),
        }
    }
}

/// A JSON value that is not an object was offered as a record.
#[derive(Debug, Error)]
#[error("records must be JSON objects, got {kind}")]
pub struct RecordShapeError {
    /// JSON type of the rejected value.
    pub kind: &'static str,
}

/// Canonical merge key derived from an identity value.
///
/// String identities are used verbatim; any other JSON value is keyed by
/// its compact JSON encoding, so `1` and `"1"` stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Canonical key for an identity value.
    pub fn from_value(value: &Value) -> RecordId {
        match value {
            Value::String(s) => RecordId(s.clone()),
            other => RecordId(other.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity-keyed merge accumulator shared across all selectors of one
/// container resolve. Single-writer: merges happen as a sequential fold.
#[derive(Debug)]
pub struct RecordSet {
    identity_field: String,
    records: BTreeMap<RecordId, Record>,
}

impl RecordSet {
    /// New empty accumulator keyed on the given identity field.
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            records: BTreeMap::new(),
        }
    }

    /// Merge one record: new identities are inserted, existing identities
    /// have the record's fields overlaid (this record wins per field).
    pub fn merge(&mut self, record: Record) -> Result<(), MissingIdentity> {
        let id = record
            .identity(&self.identity_field)
            .ok_or(MissingIdentity)?;

        match self.records.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().overlay(record);
            }
        }

        Ok(())
    }

    /// Number of distinct identities merged so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been merged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The merged records, in identity order. Callers must not rely on any
    /// particular ordering across selectors.
    pub fn into_records(self) -> Vec<Record> {
        self.records.into_values().collect()
    }
}

/// A record without its identity field was offered to the accumulator.
#[derive(Debug, Error)]
#[error("record is missing its identity field")]
pub struct MissingIdentity;
