//! Containers: pluggable data-source adapters accumulating selectors.
//!
//! Every container exposes the same capability set — accept new selectors,
//! clear accumulated selectors, resolve accumulated selectors into a
//! result — behind the [`Container`] trait. Variants are selected at
//! construction time via explicit carrier configuration, never by runtime
//! type inspection.

pub mod collection;
pub mod static_map;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ContainerError;

pub use collection::{CollectionContainer, SelectorInput};
pub use static_map::StaticMapContainer;

/// The capability set shared by all container variants.
#[async_trait]
pub trait Container: Send + Sync {
    /// Accept one accumulated item, verbatim. A JSON array is treated as a
    /// sequence of items and flattened. Validation is deferred to
    /// [`resolve`](Container::resolve).
    fn add(&mut self, item: Value);

    /// Clear everything accumulated since construction or the last reset.
    fn reset(&mut self);

    /// Resolve the accumulated items into this container's result.
    ///
    /// Safe to call with nothing accumulated: resolves to the container's
    /// empty result, never an error.
    async fn resolve(&self) -> Result<Value, ContainerError>;
}
