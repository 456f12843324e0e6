//! Error taxonomy for manifest validation and resolution.
//!
//! Errors are never swallowed: a malformed selector or failing query aborts
//! its container's resolve, and the first container failure aborts the
//! carrier-wide resolve. There is no partial-payload mode.

use thiserror::Error;

use crate::ports::SourceError;

/// Malformed manifest or selector shape.
///
/// Raised immediately for non-object input to [`Carrier::add`], and at
/// resolve time for selector inputs that were accepted verbatim by a
/// container's `add` (validation is deferred by contract).
///
/// [`Carrier::add`]: crate::Carrier::add
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `add` was given something other than an object or array of objects.
    #[error("manifest entries must be a JSON object or an array of objects, got {kind}")]
    EntriesNotObject {
        /// JSON type of the rejected input.
        kind: &'static str,
    },

    /// A selector input could not be parsed into a selector.
    #[error("selector {index} is malformed: {detail}")]
    SelectorShape {
        /// Position of the selector in the container's accumulated sequence.
        index: usize,
        /// Parse failure detail.
        detail: String,
    },

    /// A static map container was asked for a non-string key.
    #[error("static map keys must be strings, got {kind}")]
    KeyNotString {
        /// JSON type of the rejected key.
        kind: &'static str,
    },
}

/// A backing-source query failed for one specific selector.
#[derive(Debug, Error)]
#[error("query for selector {selector} failed: {source}")]
pub struct SourceQueryError {
    /// Position of the failing selector in the container's accumulated
    /// sequence.
    pub selector: usize,
    /// The backing source's own failure.
    #[source]
    pub source: SourceError,
}

/// Failure of a single container's resolve.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A selector input turned out to be malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backing source failed for one selector.
    #[error(transparent)]
    Query(#[from] SourceQueryError),

    /// The backing source returned a record without its identity field.
    #[error("record from selector {selector} is missing identity field '{field}'")]
    MissingIdentity {
        /// Selector whose query produced the record.
        selector: usize,
        /// The identity field the source declared.
        field: String,
    },
}

/// Wraps the first container failure encountered during a carrier-wide
/// resolve.
#[derive(Debug, Error)]
#[error("container '{container}' failed to resolve: {source}")]
pub struct ResolutionError {
    /// Name of the failing container.
    pub container: String,
    /// The container's failure.
    #[source]
    pub source: ContainerError,
}
