//! In-memory renderer with named templates.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::instrument;

use forgecss_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::Value,
    error::ForgeResult,
};

use super::substitute;

/// Simple renderer using basic variable substitution over templates
/// registered up front.
#[derive(Debug, Clone, Default)]
pub struct SimpleRenderer {
    templates: HashMap<String, String>,
}

impl SimpleRenderer {
    /// Create a renderer with no templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a template.
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }
}

impl TemplateRenderer for SimpleRenderer {
    #[instrument(skip_all, fields(template = %name))]
    fn render(&self, name: &str, model: &IndexMap<String, Value>) -> ForgeResult<String> {
        let source = self
            .templates
            .get(name)
            .ok_or_else(|| ApplicationError::TemplateNotFound {
                name: name.to_owned(),
            })?;
        substitute(name, source, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecss_core::error::ForgeError;

    #[test]
    fn renders_registered_template() {
        let renderer = SimpleRenderer::new().with_template("hello", "Hello, {{ name }}!");
        let mut model = IndexMap::new();
        model.insert("name".to_string(), Value::from("World"));

        assert_eq!(renderer.render("hello", &model).unwrap(), "Hello, World!");
    }

    #[test]
    fn unknown_template() {
        let err = SimpleRenderer::new()
            .render("nope", &IndexMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::TemplateNotFound { .. })
        ));
    }
}
