//! Publisher that renders templates to files under an output directory.

use std::cell::{Cell, OnceCell};
use std::fs;
use std::path::{Component, Path, PathBuf};

use lb_core::{PublishError, Publisher, TemplateCatalog, TemplatePath};
use minijinja::Environment;
use serde_json::{Map, Value};

use crate::config::{SetupError, TemplateConfig};
use crate::{context, render};

pub struct FsPublisher {
    template_root: PathBuf,
    output_root: PathBuf,
    url_root: String,
    config: TemplateConfig,
    site: Map<String, Value>,
    environment: OnceCell<Environment<'static>>,
    pages_written: Cell<usize>,
}

impl std::fmt::Debug for FsPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsPublisher")
            .field("template_root", &self.template_root)
            .field("output_root", &self.output_root)
            .field("url_root", &self.url_root)
            .field("pages_written", &self.pages_written.get())
            .finish_non_exhaustive()
    }
}

impl FsPublisher {
    pub fn new(
        template_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        config: TemplateConfig,
    ) -> Self {
        Self {
            template_root: template_root.into(),
            output_root: output_root.into(),
            url_root: "/".to_string(),
            config,
            site: Map::new(),
            environment: OnceCell::new(),
            pages_written: Cell::new(0),
        }
    }

    /// Loads `templates.toml` from `template_root` and builds a publisher for it.
    pub fn open(
        template_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, SetupError> {
        let template_root = template_root.into();
        let config = TemplateConfig::load(&template_root)?;
        Ok(Self::new(template_root, output_root, config))
    }

    #[must_use]
    pub fn with_url_root(mut self, url_root: impl Into<String>) -> Self {
        self.url_root = url_root.into();
        self
    }

    /// Site-wide settings exposed to templates as `site`.
    #[must_use]
    pub fn with_site(mut self, site: Map<String, Value>) -> Self {
        self.site = site;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub const fn pages_written(&self) -> usize {
        self.pages_written.get()
    }

    /// The template environment, built on first use from the final settings.
    fn environment(&self) -> &Environment<'static> {
        self.environment.get_or_init(|| {
            render::environment(
                self.template_root.clone(),
                self.config.templates.clone(),
                self.url_root.clone(),
            )
        })
    }

    fn render(&self, template: &str, context: &Value) -> Result<String, PublishError> {
        self.environment()
            .get_template(template)
            .and_then(|loaded| loaded.render(context))
            .map_err(|err| PublishError::Render {
                template: template.to_string(),
                message: err.to_string(),
            })
    }

    fn write_page(&self, destination: &Path, html: &str) -> Result<(), PublishError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| PublishError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(destination, html).map_err(|source| PublishError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }

    /// Copies every file matched by the configured static globs into the output.
    ///
    /// Files keep their path relative to the template root.
    pub fn copy_static_files(&self) -> Result<usize, SetupError> {
        let mut copied = 0;

        let root = glob::Pattern::escape(&self.template_root.to_string_lossy());
        for pattern in &self.config.static_files {
            let full = Path::new(&root).join(pattern);
            let matches = glob::glob(&full.to_string_lossy()).map_err(|source| SetupError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;

            for entry in matches {
                let from = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot read static file");
                        continue;
                    }
                };
                if !from.is_file() {
                    continue;
                }
                let Ok(relative) = from.strip_prefix(&self.template_root) else {
                    continue;
                };
                let to = self.output_root.join(relative);
                let copy_error = |source: std::io::Error| SetupError::Copy {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                };
                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent).map_err(copy_error)?;
                }
                fs::copy(&from, &to).map_err(copy_error)?;
                tracing::debug!(file = %relative.display(), "copied static file");
                copied += 1;
            }
        }

        Ok(copied)
    }
}

impl Publisher for FsPublisher {
    fn templates(&self) -> &TemplateCatalog {
        &self.config.templates
    }

    fn url_root(&self) -> &str {
        &self.url_root
    }

    fn publish(&self, path: &TemplatePath, context: Value) -> Result<(), PublishError> {
        let definition = self.find_template(path)?;
        let context = context::build(context, &self.site, &self.config.variables);
        let destination = definition.destination_for(&context)?;
        if !stays_inside(Path::new(&destination)) {
            return Err(PublishError::OutsideOutput { destination });
        }

        let html = self.render(&definition.template, &context)?;
        let target = self.output_root.join(&destination);
        self.write_page(&target, &html)?;
        self.pages_written.set(self.pages_written.get() + 1);

        tracing::debug!(%path, destination = %destination, "wrote page");
        Ok(())
    }
}

/// True for relative paths made only of plain names.
fn stays_inside(destination: &Path) -> bool {
    destination
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}
