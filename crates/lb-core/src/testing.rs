//! In-memory publisher used by unit tests.

use std::cell::RefCell;

use serde_json::Value;

use crate::publisher::{PublishError, Publisher};
use crate::template::{TemplateCatalog, TemplateDefinition, TemplatePath};

/// Records every published page instead of rendering it.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    templates: TemplateCatalog,
    pages: RefCell<Vec<(TemplatePath, Value)>>,
}

impl RecordingPublisher {
    pub fn new(templates: TemplateCatalog) -> Self {
        Self {
            templates,
            pages: RefCell::default(),
        }
    }

    /// Shared layouts plus the master index.
    pub fn simple_catalog() -> TemplateCatalog {
        TemplateCatalog::new()
            .with(
                ["simple", "day"],
                TemplateDefinition::new("simple/day.html", "{id}/{date}.html"),
            )
            .with(
                ["simple", "index"],
                TemplateDefinition::new("simple/index.html", "{id}/index.html"),
            )
            .with(["index"], TemplateDefinition::new("index.html", "index.html"))
    }

    pub fn simple() -> Self {
        Self::new(Self::simple_catalog())
    }

    pub fn page_count(&self) -> usize {
        self.pages.borrow().len()
    }

    /// Contexts published through `path`, oldest first.
    pub fn pages(&self, path: &TemplatePath) -> Vec<Value> {
        self.pages
            .borrow()
            .iter()
            .filter(|(published, _)| published == path)
            .map(|(_, context)| context.clone())
            .collect()
    }

    pub fn last_page(&self, path: &TemplatePath) -> Option<Value> {
        self.pages(path).pop()
    }
}

impl Publisher for RecordingPublisher {
    fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    fn publish(&self, path: &TemplatePath, context: Value) -> Result<(), PublishError> {
        // Resolve the destination so missing keys fail like a real publisher.
        self.find_template(path)?.destination_for(&context)?;
        self.pages.borrow_mut().push((path.clone(), context));
        Ok(())
    }
}
