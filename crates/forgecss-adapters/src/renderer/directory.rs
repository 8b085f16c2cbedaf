//! Renderer reading Tera templates from a directory on disk.

use std::error::Error as _;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use tera::{Context, Tera};
use tracing::{debug, instrument};

use forgecss_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::Value,
    error::ForgeResult,
};

/// Loads `<root>/<name>` on every render and renders it with Tera.
///
/// Names are relative paths below the root; absolute names and `..` are
/// rejected so a stylesheet cannot read arbitrary files. Output is never
/// HTML-escaped, whatever the template's extension.
#[derive(Debug, Clone)]
pub struct DirectoryRenderer {
    root: PathBuf,
}

impl DirectoryRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, name: &str) -> ForgeResult<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || name.is_empty() {
            return Err(ApplicationError::RenderingFailed {
                template: name.to_owned(),
                reason: "template names must be relative paths inside the templates directory"
                    .into(),
            }
            .into());
        }
        Ok(self.root.join(relative))
    }
}

impl TemplateRenderer for DirectoryRenderer {
    #[instrument(skip_all, fields(template = %name))]
    fn render(&self, name: &str, model: &IndexMap<String, Value>) -> ForgeResult<String> {
        let path = self.locate(name)?;
        if !path.is_file() {
            return Err(ApplicationError::TemplateNotFound {
                name: name.to_owned(),
            }
            .into());
        }
        debug!(path = %path.display(), "Loading template");
        let source = std::fs::read_to_string(&path)
            .map_err(|e| ApplicationError::filesystem(&path, format!("Failed to read template: {e}")))?;

        let context = Context::from_serialize(model).map_err(|e| failed(name, &e))?;
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(name, &source)
            .map_err(|e| failed(name, &e))?;
        Ok(tera.render(name, &context).map_err(|e| failed(name, &e))?)
    }
}

/// Tera reports the useful part (unknown variable, bad tag) in the source
/// chain, so the whole chain goes into the reason.
fn failed(name: &str, err: &tera::Error) -> ApplicationError {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    ApplicationError::RenderingFailed {
        template: name.to_owned(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecss_core::error::ForgeError;
    use tempfile::TempDir;

    #[test]
    fn renders_file_from_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("cs")).unwrap();
        std::fs::write(dir.path().join("cs/class.tpl"), "class {{ name }} {}").unwrap();

        let mut model = IndexMap::new();
        model.insert("name".to_string(), Value::from("Svc"));
        let renderer = DirectoryRenderer::new(dir.path());

        assert_eq!(renderer.render("cs/class.tpl", &model).unwrap(), "class Svc {}");
    }

    #[test]
    fn loops_over_array_properties() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("list.tpl"),
            "{% for e in entities %}{{ e }}{% if not loop.last %}, {% endif %}{% endfor %}\n",
        )
        .unwrap();

        let mut model = IndexMap::new();
        model.insert(
            "entities".to_string(),
            Value::Array(vec![Value::from("User"), Value::from("Order"), Value::from(3.0)]),
        );

        assert_eq!(
            DirectoryRenderer::new(dir.path()).render("list.tpl", &model).unwrap(),
            "User, Order, 3\n"
        );
    }

    #[test]
    fn nested_objects_and_no_escaping() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page.html"), "<h1>{{ app.title }}</h1>").unwrap();

        let mut app = IndexMap::new();
        app.insert("title".to_string(), Value::from("A & B"));
        let mut model = IndexMap::new();
        model.insert("app".to_string(), Value::Object(app));

        assert_eq!(
            DirectoryRenderer::new(dir.path()).render("page.html", &model).unwrap(),
            "<h1>A & B</h1>"
        );
    }

    #[test]
    fn unknown_variable_fails_with_reason() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("t.tpl"), "{{ missing }}").unwrap();

        let err = DirectoryRenderer::new(dir.path())
            .render("t.tpl", &IndexMap::new())
            .unwrap_err();
        match err {
            ForgeError::Application(ApplicationError::RenderingFailed { template, reason }) => {
                assert_eq!(template, "t.tpl");
                assert!(reason.contains("missing"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = DirectoryRenderer::new(dir.path())
            .render("nope.tpl", &IndexMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn names_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let renderer = DirectoryRenderer::new(dir.path());
        for name in ["../secret", "/etc/passwd", "a/../../b"] {
            assert!(matches!(
                renderer.render(name, &IndexMap::new()),
                Err(ForgeError::Application(ApplicationError::RenderingFailed { .. }))
            ));
        }
    }
}
