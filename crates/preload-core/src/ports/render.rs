//! Render boundary wrapped by the bootstrap adapter.
//!
//! Replaces override-the-host's-render-method wiring with an explicit
//! seam: the host pipeline renders through a [`RenderBackend`], and the
//! adapter decorates that backend so the payload is resolved and injected
//! before the underlying render runs.

use serde_json::{Map, Value};
use thiserror::Error;

/// A view renderer: template name plus a JSON context in, markup out.
pub trait RenderBackend: Send + Sync {
    /// Render `view` with the given context.
    fn render(&self, view: &str, context: &Map<String, Value>) -> Result<String, RenderError>;
}

/// Failure reported by a render backend.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The named view does not exist.
    #[error("view '{view}' not found")]
    ViewNotFound {
        /// The requested view name.
        view: String,
    },

    /// The backend failed to render; the message is the backend's own.
    #[error("render backend failure: {0}")]
    Backend(String),
}
