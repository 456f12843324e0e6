//! Normalized query descriptions accumulated by collection containers.
//!
//! A [`Selector`] deserializes from the JSON manifests handlers submit, with
//! every part optional:
//!
//! ```json
//! {
//!     "where": { "group": "staff", "region": ["emea", "apac"] },
//!     "fields": ["firstName", "lastName"],
//!     "sort": [["lastName", "asc"]],
//!     "skip": 0,
//!     "limit": 25
//! }
//! ```
//!
//! Scalar constraints mean equality, array constraints mean membership.
//! `where` also accepts an array of condition groups; groups are combined
//! with logical AND, never OR. Post-fetch row predicates cannot be carried
//! by JSON and are attached through the typed API instead.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::json_kind;
use super::record::Record;
use crate::ports::SourceQuery;

/// Post-fetch row predicate. Supports filtering on computed or joined
/// conditions the backing source cannot express.
pub type RowPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// A normalized query description attached to a collection container.
///
/// Immutable once added; containers accumulate an ordered sequence of them.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selector {
    /// Condition groups, combined with logical AND.
    #[serde(rename = "where")]
    pub filter_groups: FilterGroups,

    /// Requested fields: everything, or a finite name set.
    pub fields: FieldSpec,

    /// Ordering applied by the backing source.
    pub sort: Option<Vec<SortKey>>,

    /// Rows to drop from the front of the filtered set.
    pub skip: usize,

    /// Maximum rows kept after `skip`; 0 means unbounded.
    pub limit: usize,

    /// Post-fetch predicates, applied in order after the query returns.
    #[serde(skip)]
    pub row_filters: Vec<RowPredicate>,
}

impl Selector {
    /// Restrict the selector to a finite field set.
    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = FieldSpec::Named(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Request every backing-source field.
    pub fn all_fields(mut self) -> Self {
        self.fields = FieldSpec::All;
        self
    }

    /// Append a condition group; groups are ANDed.
    pub fn group(mut self, group: Map<String, Value>) -> Self {
        self.filter_groups.0.push(group);
        self
    }

    /// Set the number of rows to drop from the front of the filtered set.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Cap the number of rows kept after `skip`; 0 means unbounded.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Attach a post-fetch row predicate.
    pub fn row_filter(mut self, predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.row_filters.push(Arc::new(predicate));
        self
    }

    /// Build the backing-source query for this selector.
    ///
    /// The projection always carries the source's identity field; skip and
    /// limit are deliberately absent — they apply post-filter so that row
    /// predicates see the full matched set before truncation.
    pub fn plan(&self, identity_field: &str) -> SourceQuery {
        let condition = self.filter_groups.to_condition();

        let projection = match &self.fields {
            FieldSpec::All => Projection::All,
            FieldSpec::Named(names) => {
                let mut fields: BTreeSet<String> = names.iter().cloned().collect();
                fields.insert(identity_field.to_string());
                Projection::Fields(fields)
            }
        };

        SourceQuery {
            condition,
            projection,
            sort: self.sort.clone(),
        }
    }

    /// Apply post-fetch row predicates, then skip/limit, to fetched rows.
    ///
    /// Each predicate receives the previous predicate's output. Truncation
    /// happens last and only within this selector's own row set.
    pub fn narrow(&self, mut rows: Vec<Record>) -> Vec<Record> {
        for predicate in &self.row_filters {
            rows.retain(|record| predicate(record));
        }

        let rows = rows.into_iter().skip(self.skip);
        if self.limit > 0 {
            rows.take(self.limit).collect()
        } else {
            rows.collect()
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("filter_groups", &self.filter_groups)
            .field("fields", &self.fields)
            .field("sort", &self.sort)
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .field("row_filters", &self.row_filters.len())
            .finish()
    }
}

/// Ordered condition groups, kept as raw JSON objects until plan time.
///
/// Deserializes from a single object (one group) or an array of objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterGroups(pub Vec<Map<String, Value>>);

impl FilterGroups {
    /// Whether no conditions were supplied at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lower the raw groups into a typed condition: scalar constraints
    /// become equality, array constraints become membership.
    pub fn to_condition(&self) -> QueryCondition {
        let groups = self
            .0
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|(field, constraint)| {
                        let constraint = match constraint {
                            Value::Array(options) => FieldConstraint::In(options.clone()),
                            other => FieldConstraint::Eq(other.clone()),
                        };
                        (field.clone(), constraint)
                    })
                    .collect::<BTreeMap<_, _>>()
            })
            .collect();

        QueryCondition { groups }
    }
}

impl<'de> Deserialize<'de> for FilterGroups {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Object(group) => Ok(Self(vec![group])),
            Value::Array(items) => {
                let groups = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(group) => Ok(group),
                        other => Err(de::Error::custom(format!(
                            "condition groups must be objects, got {}",
                            json_kind(&other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self(groups))
            }
            other => Err(de::Error::custom(format!(
                "'where' must be an object or an array of objects, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Requested fields: everything (`"*"`) or a finite name set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSpec {
    /// Fetch every backing-source field.
    All,
    /// Fetch exactly these fields (plus the mandatory identity field).
    Named(Vec<String>),
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::Named(Vec::new())
    }
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) if s == "*" => Ok(FieldSpec::All),
            Value::String(other) => Err(de::Error::custom(format!(
                "'fields' must be \"*\" or an array of field names, got \"{other}\""
            ))),
            Value::Array(items) => {
                let names = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(name) => Ok(name),
                        other => Err(de::Error::custom(format!(
                            "field names must be strings, got {}",
                            json_kind(&other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldSpec::Named(names))
            }
            other => Err(de::Error::custom(format!(
                "'fields' must be \"*\" or an array of field names, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// One ordering key: `["lastName", "asc"]`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SortKey(pub String, pub SortOrder);

impl SortKey {
    /// Field the key orders by.
    pub fn field(&self) -> &str {
        &self.0
    }

    /// Direction of the ordering.
    pub fn order(&self) -> SortOrder {
        self.1
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Typed query condition handed to the backing source.
///
/// Empty groups match everything. Groups are ANDed, and so are the field
/// constraints within a group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryCondition {
    /// Condition groups; a record matches when every group matches.
    pub groups: Vec<BTreeMap<String, FieldConstraint>>,
}

impl QueryCondition {
    /// Evaluate the condition against a record. Missing fields compare as
    /// JSON null, so `{"field": null}` matches records without the field.
    pub fn matches(&self, record: &Record) -> bool {
        self.groups.iter().all(|group| {
            group.iter().all(|(field, constraint)| {
                constraint.matches(record.get(field).unwrap_or(&Value::Null))
            })
        })
    }
}

/// Equality-or-membership constraint on a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldConstraint {
    /// Field value must equal this value.
    Eq(Value),
    /// Field value must be one of these values.
    In(Vec<Value>),
}

impl FieldConstraint {
    /// Evaluate the constraint against a candidate field value.
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            FieldConstraint::Eq(expected) => candidate == expected,
            FieldConstraint::In(options) => options.contains(candidate),
        }
    }
}

/// Field projection handed to the backing source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Fetch every field.
    #[default]
    All,
    /// Fetch exactly these fields.
    Fields(BTreeSet<String>),
}

impl Projection {
    /// Whether a field survives this projection.
    pub fn keeps(&self, field: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Fields(fields) => fields.contains(field),
        }
    }
}
