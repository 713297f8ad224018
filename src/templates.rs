//! Template rendering
//!
//! Templates are read from disk on every render, so edits show up without a
//! restart. Rendering uses minijinja with the context serialized through serde.

use crate::error::TemplateError;
use crate::http::mime;
use minijinja::Environment;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render the template `name` (relative to the directory) with `context`
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| TemplateError::InvalidName(name.to_string()))?;
        let source = std::fs::read_to_string(&path).map_err(|source| TemplateError::Read {
            name: name.to_string(),
            source,
        })?;

        let render_error = |source: minijinja::Error| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let mut env = Environment::new();
        env.add_template(name, &source).map_err(render_error)?;
        env.get_template(name)
            .and_then(|template| template.render(context))
            .map_err(render_error)
    }

    /// Content type a rendered template should be served with
    pub fn content_type(name: &str) -> &'static str {
        mime::content_type_for(Path::new(name))
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.dir.clone();
        let mut pushed = false;
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        pushed.then_some(path)
    }
}
