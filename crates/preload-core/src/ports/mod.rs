//! Ports: the capability boundaries the engine consumes.

pub mod render;
pub mod source;

pub use render::{RenderBackend, RenderError};
pub use source::{DocumentSource, SourceError, SourceQuery};
