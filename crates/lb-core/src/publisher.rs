//! The rendering side of the pipeline, as seen by reports.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::template::{LookupFailure, TemplateCatalog, TemplateDefinition, TemplatePath};

/// Errors raised while publishing a page.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The template path is not defined.
    #[error(transparent)]
    Lookup(#[from] LookupFailure),

    /// A destination placeholder has no matching scalar in the context.
    #[error("destination `{pattern}` references missing context key `{key}`")]
    MissingContextKey { pattern: String, key: String },

    /// The formatted destination would land outside the output directory.
    #[error("destination `{destination}` leaves the output directory")]
    OutsideOutput { destination: String },

    /// The template could not be loaded, parsed or rendered.
    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },

    /// Reading a template or writing output failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders context mappings into output pages.
///
/// Reports only need to look up template paths and hand over a context; where
/// and how the page is written is up to the implementation.
pub trait Publisher {
    /// The template definitions available for this run.
    fn templates(&self) -> &TemplateCatalog;

    /// Prefix prepended to destinations when generating links.
    fn url_root(&self) -> &str {
        "/"
    }

    /// Renders the template at `path` with `context` and writes it to its destination.
    fn publish(&self, path: &TemplatePath, context: Value) -> Result<(), PublishError>;

    fn find_template(&self, path: &TemplatePath) -> Result<&TemplateDefinition, LookupFailure> {
        self.templates().find(path)
    }

    /// Link to the page `path` would produce for `context`.
    fn url_for(&self, path: &TemplatePath, context: &Value) -> Result<String, PublishError> {
        let destination = self.find_template(path)?.destination_for(context)?;
        Ok(format!("{}{destination}", self.url_root()))
    }
}
