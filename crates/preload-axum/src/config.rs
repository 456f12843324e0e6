//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the resolved payload is exposed to the render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Inject the payload object itself; the view serializes it as it
    /// sees fit.
    Data,
    /// Inject a ready-made `<script>` tag assigning the payload to a
    /// window global (see [`payload_script`](crate::payload_script)).
    ScriptTag,
}

/// Bootstrap adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Render-context key the payload is injected under.
    pub payload_slot: String,

    /// Window global assigned by the script-tag format.
    pub window_var: String,

    /// Payload exposure format.
    pub format: PayloadFormat,

    /// Optional deadline around the whole carrier resolve. A hung backing
    /// query otherwise hangs the response; production deployments should
    /// set this. `None` preserves the unbounded contract.
    pub resolve_deadline: Option<Duration>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            payload_slot: "bootstrap".to_string(),
            window_var: "bootstrapData".to_string(),
            format: PayloadFormat::Data,
            resolve_deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_expose_data_without_a_deadline() {
        let config = BootstrapConfig::default();

        assert_eq!(config.payload_slot, "bootstrap");
        assert_eq!(config.window_var, "bootstrapData");
        assert_eq!(config.format, PayloadFormat::Data);
        assert!(config.resolve_deadline.is_none());
    }

    #[test]
    fn config_deserializes_with_partial_input() {
        let config: BootstrapConfig =
            serde_json::from_str(r#"{ "format": "script_tag" }"#).unwrap();

        assert_eq!(config.format, PayloadFormat::ScriptTag);
        assert_eq!(config.payload_slot, "bootstrap");
    }
}
