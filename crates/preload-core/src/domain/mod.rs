//! Domain model: selectors, records, and the error taxonomy.

pub mod errors;
pub mod record;
pub mod selector;

pub use errors::{ContainerError, ResolutionError, SourceQueryError, ValidationError};
pub use record::{Record, RecordId, RecordSet};
pub use selector::{
    FieldConstraint, FieldSpec, FilterGroups, Projection, QueryCondition, RowPredicate, Selector,
    SortKey, SortOrder,
};

/// Human-readable name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
