//! Backing-source capability consumed by collection containers.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Projection, QueryCondition, Record, SortKey};

/// One filter+projection+sort query against a backing source.
///
/// Skip and limit are deliberately absent: they apply post-filter in the
/// container, so post-fetch row predicates see the full matched set before
/// truncation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceQuery {
    /// What to match. Empty condition matches everything.
    pub condition: QueryCondition,
    /// Which fields to return. Always carries the identity field when
    /// finite.
    pub projection: Projection,
    /// Ordering to apply, if any.
    pub sort: Option<Vec<SortKey>>,
}

/// A queryable document store over one named collection.
///
/// Every returned record must carry the field named by
/// [`identity_field`](DocumentSource::identity_field); the engine uses it
/// as the merge key.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name of the identity field carried by this source's records.
    fn identity_field(&self) -> &str {
        "_id"
    }

    /// Execute a query and return the matching rows.
    async fn query(&self, query: &SourceQuery) -> Result<Vec<Record>, SourceError>;
}

/// Failure reported by a backing source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend failed; the message is the backend's own.
    #[error("backend failure: {0}")]
    Backend(String),
}
