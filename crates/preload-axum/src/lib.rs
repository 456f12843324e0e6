//! # preload-axum
//!
//! Render-hook adapter wiring the preload carrier into an axum/tower
//! request pipeline.
//!
//! The original monkey-patch — overriding the response's render method to
//! sneak payload loading in front of it — is replaced by two explicit
//! extension points:
//!
//! - [`CarrierLayer`] constructs a **fresh** [`Carrier`] for every request
//!   and stores it in request extensions; handlers reach it through the
//!   [`RequestCarrier`] extractor. No process-wide carrier state exists.
//! - [`BootstrapRenderer`] wraps any [`RenderBackend`]: it resolves the
//!   carrier, injects the payload into the render context under the
//!   configured slot, and only then delegates to the underlying backend.
//!   A resolution failure aborts before the backend is invoked and
//!   surfaces through axum's normal error channel as a 500 — rendering
//!   never proceeds with partial or missing data.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/", get(index))
//!     .layer(CarrierLayer::new(move || {
//!         Carrier::builder()
//!             .container("contacts", CollectionContainer::new(Arc::clone(&source)))
//!             .build()
//!     }));
//!
//! async fn index(carrier: RequestCarrier) -> Result<Html<String>, BootstrapError> {
//!     carrier.add(json!({ "contacts": { "fields": ["firstName"] } })).await?;
//!     let html = renderer.render(&carrier, "index.html", Map::new()).await?;
//!     Ok(Html(html))
//! }
//! ```
//!
//! [`Carrier`]: preload_core::Carrier
//! [`RenderBackend`]: preload_core::RenderBackend

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod extract;
pub mod layer;
pub mod render;
pub mod script;

pub use config::{BootstrapConfig, PayloadFormat};
pub use error::BootstrapError;
pub use extract::RequestCarrier;
pub use layer::{CarrierFactory, CarrierLayer, CarrierService};
pub use render::BootstrapRenderer;
pub use script::payload_script;
