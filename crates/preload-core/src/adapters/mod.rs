//! Adapters: in-memory implementations of the backing-source port, used by
//! tests and the demo application.

pub mod memory;

pub use memory::{FailingSource, MemorySource};
