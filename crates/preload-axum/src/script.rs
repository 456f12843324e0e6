//! Inline script-tag rendering of the resolved payload.

use serde_json::{Map, Value};

/// Render the payload as an inline `<script>` tag assigning a window
/// global, for direct embedding in server-rendered HTML.
///
/// `<` is emitted as the JSON escape `\u003c`, so a payload value
/// containing `</script>` cannot terminate the tag early. `window_var`
/// comes from adapter configuration, not request data.
pub fn payload_script(window_var: &str, payload: &Map<String, Value>) -> String {
    let json = serde_json::to_string(payload).unwrap_or_else(|_| String::from("{}"));
    let json = json.replace('<', "\\u003c");

    format!("<script>window.{window_var} = {json};</script>")
}
