//! Carrier: the per-request orchestrator.
//!
//! Holds a fixed set of named containers plus an overflow map for values
//! submitted under names with no matching container. Carriers are
//! constructed fresh per request scope — there is no process-wide carrier
//! state.

use std::collections::BTreeMap;

use futures::future;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::containers::Container;
use crate::domain::{json_kind, ResolutionError, ValidationError};

/// Per-request orchestrator over named containers and overflow values.
pub struct Carrier {
    containers: BTreeMap<String, Box<dyn Container>>,
    overflow: Map<String, Value>,
}

impl Carrier {
    /// Start configuring a carrier.
    pub fn builder() -> CarrierBuilder {
        CarrierBuilder::default()
    }

    /// Route manifest entries to their containers.
    ///
    /// Accepts a JSON object or an array of objects (applied in order).
    /// Each entry whose name matches a configured container is forwarded to
    /// that container's `add`; anything else lands verbatim in the overflow
    /// map, overwriting any prior overflow value for that name.
    pub fn add(&mut self, entries: Value) -> Result<(), ValidationError> {
        match entries {
            Value::Object(entries) => {
                self.add_entries(entries);
                Ok(())
            }
            Value::Array(batches) => {
                for batch in batches {
                    match batch {
                        Value::Object(entries) => self.add_entries(entries),
                        other => {
                            return Err(ValidationError::EntriesNotObject {
                                kind: json_kind(&other),
                            })
                        }
                    }
                }
                Ok(())
            }
            other => Err(ValidationError::EntriesNotObject {
                kind: json_kind(&other),
            }),
        }
    }

    fn add_entries(&mut self, entries: Map<String, Value>) {
        for (name, value) in entries {
            match self.containers.get_mut(&name) {
                Some(container) => container.add(value),
                None => {
                    self.overflow.insert(name, value);
                }
            }
        }
    }

    /// Clear every container's accumulated selectors and the overflow map.
    pub fn reset(&mut self) {
        for container in self.containers.values_mut() {
            container.reset();
        }
        self.overflow.clear();
    }

    /// Resolve every container concurrently and combine the results.
    ///
    /// Fan-out, join-all, fail-fast: the first container failure cancels
    /// the join and propagates wrapped with the container's name. The
    /// overflow map is overlaid last, so an overflow value wins a name
    /// collision. Safe to call with nothing accumulated.
    pub async fn resolve(&self) -> Result<Map<String, Value>, ResolutionError> {
        debug!(
            containers = self.containers.len(),
            overflow = self.overflow.len(),
            "resolving carrier"
        );

        let resolutions = self.containers.iter().map(|(name, container)| async move {
            match container.resolve().await {
                Ok(contents) => Ok((name.clone(), contents)),
                Err(source) => Err(ResolutionError {
                    container: name.clone(),
                    source,
                }),
            }
        });

        let resolved = match future::try_join_all(resolutions).await {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(container = %error.container, error = %error, "carrier resolution failed");
                return Err(error);
            }
        };

        let mut payload: Map<String, Value> = resolved.into_iter().collect();
        for (name, value) in &self.overflow {
            payload.insert(name.clone(), value.clone());
        }

        Ok(payload)
    }
}

/// Construction-time configuration of a carrier's container set.
///
/// The set of names is fixed once built; there is no runtime registry.
#[derive(Default)]
pub struct CarrierBuilder {
    containers: BTreeMap<String, Box<dyn Container>>,
}

impl CarrierBuilder {
    /// Register a named container.
    pub fn container(
        mut self,
        name: impl Into<String>,
        container: impl Container + 'static,
    ) -> Self {
        self.containers.insert(name.into(), Box::new(container));
        self
    }

    /// Finish configuration.
    pub fn build(self) -> Carrier {
        Carrier {
            containers: self.containers,
            overflow: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FailingSource, MemorySource};
    use crate::containers::{CollectionContainer, StaticMapContainer};
    use serde_json::json;
    use std::sync::Arc;

    fn contacts_container() -> CollectionContainer {
        CollectionContainer::new(Arc::new(MemorySource::from_values([
            json!({ "_id": 1, "first": "Al", "last": "B" }),
            json!({ "_id": 2, "first": "Cy", "last": "D" }),
        ])))
    }

    fn carrier() -> Carrier {
        Carrier::builder()
            .container("contacts", contacts_container())
            .build()
    }

    #[tokio::test]
    async fn entries_route_to_containers_and_overflow() {
        let mut carrier = carrier();
        carrier
            .add(json!({ "contacts": { "fields": ["first"] }, "extra": 42 }))
            .unwrap();

        let payload = carrier.resolve().await.unwrap();

        assert_eq!(payload["extra"], json!(42));
        let contacts = payload["contacts"].as_array().expect("array payload");
        assert_eq!(contacts.len(), 2);
        assert!(contacts.contains(&json!({ "_id": 1, "first": "Al" })));
    }

    #[tokio::test]
    async fn entries_accept_a_sequence_of_objects_in_order() {
        let mut carrier = carrier();
        carrier
            .add(json!([{ "flag": 1 }, { "flag": 2 }]))
            .unwrap();

        let payload = carrier.resolve().await.unwrap();
        assert_eq!(payload["flag"], json!(2));
    }

    #[tokio::test]
    async fn non_object_entries_are_rejected() {
        let mut carrier = carrier();

        assert!(matches!(
            carrier.add(json!("nope")).unwrap_err(),
            ValidationError::EntriesNotObject { kind: "string" }
        ));
        assert!(matches!(
            carrier.add(json!([1])).unwrap_err(),
            ValidationError::EntriesNotObject { kind: "number" }
        ));
    }

    #[tokio::test]
    async fn later_overflow_value_overwrites_earlier() {
        let mut carrier = carrier();
        carrier.add(json!({ "extra": 1 })).unwrap();
        carrier.add(json!({ "extra": 2 })).unwrap();

        let payload = carrier.resolve().await.unwrap();
        assert_eq!(payload["extra"], json!(2));
    }

    #[tokio::test]
    async fn resolve_with_nothing_added_returns_empty_container_results() {
        let carrier = Carrier::builder()
            .container("contacts", contacts_container())
            .container(
                "settings",
                StaticMapContainer::new(Map::from_iter([("a".into(), json!(1))])),
            )
            .build();

        let payload = carrier.resolve().await.unwrap();

        assert_eq!(payload["contacts"], json!([]));
        assert_eq!(payload["settings"], json!({}));
    }

    #[tokio::test]
    async fn reset_clears_containers_and_overflow() {
        let mut carrier = carrier();
        carrier
            .add(json!({ "contacts": { "fields": ["first"] }, "extra": 42 }))
            .unwrap();
        carrier.reset();

        let payload = carrier.resolve().await.unwrap();
        assert_eq!(Value::Object(payload), json!({ "contacts": [] }));
    }

    #[tokio::test]
    async fn first_container_failure_fails_the_whole_resolve() {
        let mut carrier = Carrier::builder()
            .container("contacts", contacts_container())
            .container(
                "broken",
                CollectionContainer::new(Arc::new(FailingSource::new("connection refused"))),
            )
            .build();
        carrier
            .add(json!({ "contacts": {}, "broken": {} }))
            .unwrap();

        let err = carrier.resolve().await.unwrap_err();
        assert_eq!(err.container, "broken");
    }

    #[tokio::test]
    async fn overflow_wins_a_name_collision() {
        // Collisions are unreachable through `add` (it routes by name), so
        // pin the overlay order against the internals directly.
        let mut carrier = carrier();
        carrier
            .overflow
            .insert("contacts".into(), json!("shadowed"));

        let payload = carrier.resolve().await.unwrap();
        assert_eq!(payload["contacts"], json!("shadowed"));
    }
}
