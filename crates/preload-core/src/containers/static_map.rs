//! Static map container: the in-memory key/value variant.
//!
//! Backed by an immutable mapping fixed at construction. Handlers
//! accumulate requested keys; resolve returns the sub-map of backing
//! entries for those keys. Keys absent from the backing map are silently
//! skipped — a manifest may speculatively request keys only some
//! deployments define.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{json_kind, ContainerError, ValidationError};

use super::Container;

/// Container backed by an in-memory key/value source.
pub struct StaticMapContainer {
    backing: Map<String, Value>,
    keys: Vec<Value>,
}

impl StaticMapContainer {
    /// New container over an immutable backing map.
    pub fn new(backing: Map<String, Value>) -> Self {
        Self {
            backing,
            keys: Vec::new(),
        }
    }

    /// Append requested keys. Duplicates are allowed and harmless.
    pub fn add_keys(&mut self, keys: impl IntoIterator<Item = impl Into<String>>) {
        self.keys
            .extend(keys.into_iter().map(|key| Value::String(key.into())));
    }

    /// Resolve the accumulated keys against the backing map.
    pub fn resolve_map(&self) -> Result<Map<String, Value>, ContainerError> {
        let mut contents = Map::new();

        for key in &self.keys {
            let key = match key {
                Value::String(key) => key,
                other => {
                    return Err(ValidationError::KeyNotString {
                        kind: json_kind(other),
                    }
                    .into())
                }
            };

            if let Some(value) = self.backing.get(key) {
                contents.insert(key.clone(), value.clone());
            }
        }

        Ok(contents)
    }
}

#[async_trait]
impl Container for StaticMapContainer {
    fn add(&mut self, item: Value) {
        match item {
            Value::Array(keys) => self.keys.extend(keys),
            key => self.keys.push(key),
        }
    }

    fn reset(&mut self) {
        self.keys.clear();
    }

    async fn resolve(&self) -> Result<Value, ContainerError> {
        Ok(Value::Object(self.resolve_map()?))
    }
}
