//! Request-scoped carrier handle and its extractor.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use preload_core::{Carrier, ResolutionError, ValidationError};

/// Shared handle to the request's carrier.
///
/// Cloning shares the same underlying carrier; handlers and the renderer
/// both work against the one instance installed by
/// [`CarrierLayer`](crate::CarrierLayer).
#[derive(Clone)]
pub struct RequestCarrier {
    inner: Arc<Mutex<Carrier>>,
}

impl RequestCarrier {
    /// Wrap a carrier for request-extension storage.
    pub fn new(carrier: Carrier) -> Self {
        Self {
            inner: Arc::new(Mutex::new(carrier)),
        }
    }

    /// Route manifest entries to the carrier. See [`Carrier::add`].
    pub async fn add(&self, entries: Value) -> Result<(), ValidationError> {
        self.inner.lock().await.add(entries)
    }

    /// Clear everything accumulated so far. See [`Carrier::reset`].
    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    /// Resolve the carrier into the combined payload. See
    /// [`Carrier::resolve`].
    pub async fn resolve(&self) -> Result<Map<String, Value>, ResolutionError> {
        self.inner.lock().await.resolve().await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestCarrier
where
    S: Send + Sync,
{
    type Rejection = CarrierNotInstalled;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestCarrier>()
            .cloned()
            .ok_or(CarrierNotInstalled)
    }
}

/// Rejection when no [`CarrierLayer`](crate::CarrierLayer) wraps the route.
#[derive(Debug)]
pub struct CarrierNotInstalled;

impl IntoResponse for CarrierNotInstalled {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "carrier layer not installed for this route",
        )
            .into_response()
    }
}
