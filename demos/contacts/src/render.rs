//! MiniJinja implementation of the render backend.

use minijinja::Environment;
use serde_json::{Map, Value};

use preload_core::{RenderBackend, RenderError};

/// Render backend over an embedded template set.
pub struct JinjaBackend {
    env: Environment<'static>,
}

impl JinjaBackend {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }
}

impl RenderBackend for JinjaBackend {
    fn render(&self, view: &str, context: &Map<String, Value>) -> Result<String, RenderError> {
        let template = self
            .env
            .get_template(view)
            .map_err(|_| RenderError::ViewNotFound {
                view: view.to_string(),
            })?;

        template
            .render(context)
            .map_err(|err| RenderError::Backend(err.to_string()))
    }
}
