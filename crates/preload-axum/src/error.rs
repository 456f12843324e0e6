//! Adapter-boundary errors, routed through axum's response channel.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use preload_core::{RenderError, ResolutionError, ValidationError};

/// Failure while bootstrapping a response.
///
/// Converts into a 500 response: rendering must never proceed with a
/// partial or missing payload, so the error takes the pipeline's normal
/// error channel instead.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A handler submitted a malformed manifest.
    #[error("manifest rejected: {0}")]
    Manifest(#[from] ValidationError),

    /// The carrier failed to resolve.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The configured resolve deadline elapsed.
    #[error("payload resolution exceeded the {}ms deadline", .deadline.as_millis())]
    DeadlineExceeded {
        /// The configured deadline.
        deadline: Duration,
    },

    /// The underlying render backend failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for BootstrapError {
    fn into_response(self) -> Response {
        error!(error = %self, "bootstrap rendering aborted");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
