//! Template directory configuration (`templates.toml`).

use std::path::{Path, PathBuf};

use lb_core::TemplateCatalog;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::builtin;

pub const CONFIG_FILE: &str = "templates.toml";

/// Errors raised while preparing the publisher.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template configuration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid static file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Template definitions, shared variables and static assets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Nested template definitions keyed by path segment.
    pub templates: TemplateCatalog,
    /// Merged into every render context under `template`.
    pub variables: Map<String, Value>,
    /// Globs, relative to the template root, of files copied verbatim.
    pub static_files: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            templates: builtin::catalog(),
            variables: Map::new(),
            static_files: Vec::new(),
        }
    }
}

impl TemplateConfig {
    /// Reads `templates.toml` from `root`, using the built-in layouts when absent.
    pub fn load(root: &Path) -> Result<Self, SetupError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "no template configuration, using built-in layouts"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| SetupError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| SetupError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            static_files = config.static_files.len(),
            "loaded template configuration"
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Checks that every static file pattern is a valid glob.
    pub fn validate(&self) -> Result<(), SetupError> {
        for pattern in &self.static_files {
            glob::Pattern::new(pattern).map_err(|source| SetupError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
