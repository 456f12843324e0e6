//! # preload-core
//!
//! Container aggregation and record-merge engine for bootstrapping
//! client-side state in a single response, without a follow-up API
//! round-trip.
//!
//! ## Role in a request cycle
//!
//! Request handlers accumulate *manifests* — JSON descriptions of what each
//! named data source should fetch — on a per-request [`Carrier`]. Just
//! before the response is rendered, the carrier resolves every configured
//! container concurrently and combines their outputs with any loose
//! overflow values into one payload map:
//!
//! ```text
//! handler ──add──→ Carrier ──┬──→ CollectionContainer ──→ DocumentSource
//!                            ├──→ StaticMapContainer
//!                            └──→ overflow values
//!                 resolve()  ⇒  { name → data, ... }  →  render context
//! ```
//!
//! ## Merge invariant
//!
//! Within a [`CollectionContainer`], records fetched by different selectors
//! that share an identity are merged field-by-field: the result set holds
//! exactly one record per distinct identity, carrying the union of all
//! fields any selector requested for it, with later-accumulated selectors
//! winning on field collision.
//!
//! ## Failure policy
//!
//! Fail-fast everywhere: a failing selector fails its container, a failing
//! container fails the whole resolve, and no partial payload is ever
//! produced.
//!
//! ## Usage
//!
//! ```ignore
//! use preload_core::{Carrier, CollectionContainer, MemorySource};
//! use serde_json::json;
//!
//! let source = Arc::new(MemorySource::new(rows));
//! let mut carrier = Carrier::builder()
//!     .container("contacts", CollectionContainer::new(source))
//!     .build();
//!
//! carrier.add(json!({ "contacts": { "fields": ["firstName"] }, "flags": 7 }))?;
//! let payload = carrier.resolve().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod carrier;
pub mod containers;
pub mod domain;
pub mod ports;

pub use adapters::{FailingSource, MemorySource};
pub use carrier::{Carrier, CarrierBuilder};
pub use containers::{CollectionContainer, Container, SelectorInput, StaticMapContainer};
pub use domain::{
    ContainerError, FieldConstraint, FieldSpec, FilterGroups, Projection, QueryCondition, Record,
    RecordId, RecordSet, ResolutionError, RowPredicate, Selector, SortKey, SortOrder,
    SourceQueryError, ValidationError,
};
pub use ports::{DocumentSource, RenderBackend, RenderError, SourceError, SourceQuery};
