//! Resolve-then-render wrapper around a render backend.

use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use preload_core::RenderBackend;

use crate::config::{BootstrapConfig, PayloadFormat};
use crate::error::BootstrapError;
use crate::extract::RequestCarrier;
use crate::script::payload_script;

/// Wraps a render backend so every render is preceded by a carrier
/// resolve.
///
/// On success the payload is injected into the render context under the
/// configured slot and the inner backend runs with the original view and
/// context. On failure the inner backend is never invoked.
pub struct BootstrapRenderer<R> {
    backend: R,
    config: BootstrapConfig,
}

impl<R: RenderBackend> BootstrapRenderer<R> {
    /// Wrap a backend with the default configuration.
    pub fn new(backend: R) -> Self {
        Self::with_config(backend, BootstrapConfig::default())
    }

    /// Wrap a backend with an explicit configuration.
    pub fn with_config(backend: R, config: BootstrapConfig) -> Self {
        Self { backend, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Resolve the carrier, inject the payload, and render the view.
    pub async fn render(
        &self,
        carrier: &RequestCarrier,
        view: &str,
        mut context: Map<String, Value>,
    ) -> Result<String, BootstrapError> {
        let payload = match self.config.resolve_deadline {
            Some(deadline) => match timeout(deadline, carrier.resolve()).await {
                Ok(resolved) => resolved?,
                Err(_) => {
                    warn!(
                        deadline_ms = deadline.as_millis() as u64,
                        view, "payload resolution timed out"
                    );
                    return Err(BootstrapError::DeadlineExceeded { deadline });
                }
            },
            None => carrier.resolve().await?,
        };

        debug!(view, keys = payload.len(), "injecting bootstrap payload");

        let slot_value = match self.config.format {
            PayloadFormat::Data => Value::Object(payload),
            PayloadFormat::ScriptTag => {
                Value::String(payload_script(&self.config.window_var, &payload))
            }
        };
        context.insert(self.config.payload_slot.clone(), slot_value);

        Ok(self.backend.render(view, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use preload_core::{
        Carrier, CollectionContainer, Container, ContainerError, FailingSource, RenderError,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Backend that records every render call.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        calls: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
    }

    impl RenderBackend for RecordingBackend {
        fn render(&self, view: &str, context: &Map<String, Value>) -> Result<String, RenderError> {
            self.calls
                .lock()
                .expect("backend mutex")
                .push((view.to_string(), context.clone()));
            Ok(format!("rendered {view}"))
        }
    }

    fn overflow_carrier() -> RequestCarrier {
        RequestCarrier::new(Carrier::builder().build())
    }

    #[tokio::test]
    async fn payload_is_injected_under_the_configured_slot() {
        let backend = RecordingBackend::default();
        let renderer = BootstrapRenderer::new(backend.clone());
        let carrier = overflow_carrier();
        carrier.add(json!({ "flags": { "beta": true } })).await.unwrap();

        let html = renderer
            .render(&carrier, "index.html", Map::new())
            .await
            .unwrap();

        assert_eq!(html, "rendered index.html");
        let calls = backend.calls.lock().unwrap();
        let (view, context) = &calls[0];
        assert_eq!(view, "index.html");
        assert_eq!(context["bootstrap"], json!({ "flags": { "beta": true } }));
    }

    #[tokio::test]
    async fn script_tag_format_injects_markup() {
        let config = BootstrapConfig {
            format: PayloadFormat::ScriptTag,
            ..BootstrapConfig::default()
        };
        let backend = RecordingBackend::default();
        let renderer = BootstrapRenderer::with_config(backend.clone(), config);
        let carrier = overflow_carrier();
        carrier.add(json!({ "n": 1 })).await.unwrap();

        renderer
            .render(&carrier, "index.html", Map::new())
            .await
            .unwrap();

        let calls = backend.calls.lock().unwrap();
        let script = calls[0].1["bootstrap"].as_str().unwrap();
        assert_eq!(script, r#"<script>window.bootstrapData = {"n":1};</script>"#);
    }

    #[tokio::test]
    async fn resolution_failure_aborts_before_the_backend_runs() {
        let backend = RecordingBackend::default();
        let renderer = BootstrapRenderer::new(backend.clone());

        let mut inner = Carrier::builder()
            .container(
                "broken",
                CollectionContainer::new(Arc::new(FailingSource::new("down"))),
            )
            .build();
        inner.add(json!({ "broken": {} })).unwrap();
        let carrier = RequestCarrier::new(inner);

        let err = renderer
            .render(&carrier, "index.html", Map::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Resolution(_)));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    /// Container whose resolve never finishes in test time.
    struct StalledContainer;

    #[async_trait]
    impl Container for StalledContainer {
        fn add(&mut self, _item: Value) {}
        fn reset(&mut self) {}

        async fn resolve(&self) -> Result<Value, ContainerError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn elapsed_deadline_surfaces_as_a_failure() {
        let config = BootstrapConfig {
            resolve_deadline: Some(Duration::from_millis(10)),
            ..BootstrapConfig::default()
        };
        let backend = RecordingBackend::default();
        let renderer = BootstrapRenderer::with_config(backend.clone(), config);
        let carrier = RequestCarrier::new(
            Carrier::builder().container("stalled", StalledContainer).build(),
        );

        let err = renderer
            .render(&carrier, "index.html", Map::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::DeadlineExceeded { .. }));
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
