//! Collection container: the document-store-backed variant.
//!
//! Accumulates selectors, runs one backing-source query per selector with
//! the queries in flight concurrently, then folds every fetched row into a
//! single identity-keyed accumulator. The fold is sequential in
//! accumulation order, so "later-processed selector wins on field
//! collision" deterministically means "later-accumulated".

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    ContainerError, Record, RecordSet, Selector, SourceQueryError, ValidationError,
};
use crate::ports::DocumentSource;

use super::Container;

/// One accumulated selector input: raw manifest JSON, or an already-typed
/// selector (the only way to attach post-fetch row predicates).
#[derive(Debug)]
pub enum SelectorInput {
    /// Verbatim manifest JSON; parsed at resolve time.
    Raw(Value),
    /// A typed selector added through the container's own API.
    Typed(Selector),
}

impl SelectorInput {
    fn parse(&self, index: usize) -> Result<Selector, ValidationError> {
        match self {
            SelectorInput::Raw(value) => serde_json::from_value(value.clone()).map_err(|err| {
                ValidationError::SelectorShape {
                    index,
                    detail: err.to_string(),
                }
            }),
            SelectorInput::Typed(selector) => Ok(selector.clone()),
        }
    }
}

impl From<Value> for SelectorInput {
    fn from(value: Value) -> Self {
        SelectorInput::Raw(value)
    }
}

impl From<Selector> for SelectorInput {
    fn from(selector: Selector) -> Self {
        SelectorInput::Typed(selector)
    }
}

/// Container backed by an external queryable data source.
pub struct CollectionContainer {
    source: Arc<dyn DocumentSource>,
    inputs: Vec<SelectorInput>,
}

impl CollectionContainer {
    /// New container over a backing source. The source handle is fixed for
    /// the container's lifetime.
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            inputs: Vec::new(),
        }
    }

    /// Append a selector to the accumulated sequence. Never deduplicates
    /// and never validates; raw JSON arrays are flattened into one entry
    /// per element.
    pub fn push_selector(&mut self, input: impl Into<SelectorInput>) {
        match input.into() {
            SelectorInput::Raw(Value::Array(items)) => {
                self.inputs.extend(items.into_iter().map(SelectorInput::Raw));
            }
            other => self.inputs.push(other),
        }
    }

    /// Whether any selectors are accumulated.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Resolve every accumulated selector and merge the results by record
    /// identity.
    ///
    /// Queries run concurrently; the first failure aborts the whole
    /// resolve and identifies the failing selector. Record order in the
    /// returned sequence is not guaranteed across merged selectors.
    pub async fn resolve_records(&self) -> Result<Vec<Record>, ContainerError> {
        let selectors = self
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| input.parse(index))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(selectors = selectors.len(), "resolving collection container");

        let fetches = selectors.iter().enumerate().map(|(index, selector)| {
            let source = Arc::clone(&self.source);
            async move {
                let query = selector.plan(source.identity_field());
                let rows = source.query(&query).await.map_err(|error| {
                    warn!(selector = index, error = %error, "backing-source query failed");
                    SourceQueryError {
                        selector: index,
                        source: error,
                    }
                })?;
                Ok::<Vec<Record>, SourceQueryError>(selector.narrow(rows))
            }
        });

        let narrowed = future::try_join_all(fetches).await?;

        let mut merged = RecordSet::new(self.source.identity_field());
        for (index, rows) in narrowed.into_iter().enumerate() {
            for record in rows {
                merged
                    .merge(record)
                    .map_err(|_| ContainerError::MissingIdentity {
                        selector: index,
                        field: self.source.identity_field().to_string(),
                    })?;
            }
        }

        Ok(merged.into_records())
    }
}

#[async_trait]
impl Container for CollectionContainer {
    fn add(&mut self, item: Value) {
        self.push_selector(item);
    }

    fn reset(&mut self) {
        self.inputs.clear();
    }

    async fn resolve(&self) -> Result<Value, ContainerError> {
        let records = self.resolve_records().await?;
        Ok(Value::Array(
            records.into_iter().map(Record::into_value).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FailingSource, MemorySource};
    use crate::ports::{SourceError, SourceQuery};
    use serde_json::json;

    fn contacts() -> Arc<MemorySource> {
        Arc::new(MemorySource::from_values([
            json!({ "_id": 1, "first": "Al", "last": "B" }),
            json!({ "_id": 2, "first": "Cy", "last": "D" }),
        ]))
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records
            .iter()
            .map(|r| r.get("_id").and_then(Value::as_u64).expect("numeric id"))
            .collect()
    }

    #[tokio::test]
    async fn overlapping_selectors_merge_into_one_record_per_identity() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": ["first"] }));
        container.push_selector(json!({ "fields": ["last"] }));

        let mut records = container.resolve_records().await.unwrap();
        records.sort_by_key(|r| r.get("_id").and_then(Value::as_u64));

        assert_eq!(
            records,
            vec![
                Record::try_from(json!({ "_id": 1, "first": "Al", "last": "B" })).unwrap(),
                Record::try_from(json!({ "_id": 2, "first": "Cy", "last": "D" })).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn limit_truncates_within_a_single_selector() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": ["first"], "limit": 1 }));

        let records = container.resolve_records().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            Record::try_from(json!({ "_id": 1, "first": "Al" })).unwrap()
        );
    }

    #[tokio::test]
    async fn limit_does_not_truncate_across_merged_selectors() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": ["first"], "limit": 1 }));
        container.push_selector(json!({ "fields": ["last"] }));

        let records = container.resolve_records().await.unwrap();

        // The limited selector contributes one record; the unlimited one
        // still touches both identities.
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn star_fields_fetch_everything() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": "*", "limit": 1 }));

        let records = container.resolve_records().await.unwrap();
        assert_eq!(
            records[0],
            Record::try_from(json!({ "_id": 1, "first": "Al", "last": "B" })).unwrap()
        );
    }

    #[tokio::test]
    async fn add_order_does_not_change_the_identity_set() {
        let forward = {
            let mut c = CollectionContainer::new(contacts());
            c.push_selector(json!({ "where": { "_id": 1 } }));
            c.push_selector(json!({ "where": { "_id": [1, 2] } }));
            c.resolve_records().await.unwrap()
        };
        let reverse = {
            let mut c = CollectionContainer::new(contacts());
            c.push_selector(json!({ "where": { "_id": [1, 2] } }));
            c.push_selector(json!({ "where": { "_id": 1 } }));
            c.resolve_records().await.unwrap()
        };

        assert_eq!(ids(&forward), ids(&reverse));
    }

    #[tokio::test]
    async fn row_predicates_narrow_before_truncation() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(
            Selector::default()
                .fields(["first"])
                .row_filter(|record| record.get("first") == Some(&json!("Cy")))
                .limit(1),
        );

        let records = container.resolve_records().await.unwrap();

        // Without the predicate, limit 1 would keep record 1; the predicate
        // sees the full matched set first.
        assert_eq!(ids(&records), vec![2]);
    }

    #[tokio::test]
    async fn resolve_with_nothing_accumulated_is_empty() {
        let container = CollectionContainer::new(contacts());
        assert!(container.resolve_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_accumulated_selectors() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": "*" }));
        container.reset();

        assert!(container.is_empty());
        assert!(container.resolve_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_selector_is_accepted_by_add_and_rejected_by_resolve() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!({ "fields": ["first"] }));
        container.push_selector(json!(42));

        let err = container.resolve_records().await.unwrap_err();
        match err {
            ContainerError::Validation(ValidationError::SelectorShape { index, .. }) => {
                assert_eq!(index, 1);
            }
            other => panic!("expected a selector shape error, got {other:?}"),
        }
    }

    /// Source that fails only for conditions naming the field "boom".
    struct TriggeredSource {
        inner: Arc<MemorySource>,
    }

    #[async_trait]
    impl DocumentSource for TriggeredSource {
        async fn query(&self, query: &SourceQuery) -> Result<Vec<Record>, SourceError> {
            let triggered = query
                .condition
                .groups
                .iter()
                .any(|group| group.contains_key("boom"));
            if triggered {
                return Err(SourceError::Backend("boom".into()));
            }
            self.inner.query(query).await
        }
    }

    #[tokio::test]
    async fn query_failure_identifies_the_failing_selector() {
        let source = Arc::new(TriggeredSource { inner: contacts() });
        let mut container = CollectionContainer::new(source);
        container.push_selector(json!({ "fields": ["first"] }));
        container.push_selector(json!({ "where": { "boom": true } }));

        let err = container.resolve_records().await.unwrap_err();
        match err {
            ContainerError::Query(SourceQueryError { selector, .. }) => assert_eq!(selector, 1),
            other => panic!("expected a query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_source_aborts_the_resolve() {
        let mut container =
            CollectionContainer::new(Arc::new(FailingSource::new("connection refused")));
        container.push_selector(json!({}));

        assert!(matches!(
            container.resolve_records().await.unwrap_err(),
            ContainerError::Query(SourceQueryError { selector: 0, .. })
        ));
    }

    #[tokio::test]
    async fn raw_array_input_flattens_into_separate_selectors() {
        let mut container = CollectionContainer::new(contacts());
        container.push_selector(json!([{ "fields": ["first"] }, { "fields": ["last"] }]));

        let records = container.resolve_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record::try_from(json!({ "_id": 1, "first": "Al", "last": "B" })).unwrap()
        );
    }
}
