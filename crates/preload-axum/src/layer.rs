//! Tower layer installing a fresh carrier per request.

use std::sync::Arc;

use axum::http::Request;
use tower::{Layer, Service};

use preload_core::Carrier;

use crate::extract::RequestCarrier;

/// Builds one carrier per incoming request.
///
/// Carriers and their containers are request-scoped; the factory is the
/// only thing shared across requests, and it must build everything fresh.
pub type CarrierFactory = Arc<dyn Fn() -> Carrier + Send + Sync>;

/// Layer that stores a fresh [`RequestCarrier`] in request extensions.
#[derive(Clone)]
pub struct CarrierLayer {
    factory: CarrierFactory,
}

impl CarrierLayer {
    /// New layer around a carrier factory.
    pub fn new(factory: impl Fn() -> Carrier + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl<S> Layer<S> for CarrierLayer {
    type Service = CarrierService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CarrierService {
            inner,
            factory: Arc::clone(&self.factory),
        }
    }
}

/// Service produced by [`CarrierLayer`].
#[derive(Clone)]
pub struct CarrierService<S> {
    inner: S,
    factory: CarrierFactory,
}

impl<S, B> Service<Request<B>> for CarrierService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut()
            .insert(RequestCarrier::new((self.factory)()));
        self.inner.call(req)
    }
}
