//! Template paths and the nested catalog they are resolved against.
//!
//! A template path such as `simple/day` names a leaf in a nested mapping of
//! template definitions. Each leaf pairs a template file with a destination
//! pattern like `{id}/{date}.html`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::publisher::PublishError;

/// Placeholder syntax used by destination patterns.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Fallback namespace shared by reports without their own layouts.
pub const SIMPLE_NAMESPACE: &str = "simple";

/// Page name of a single day within a report namespace.
pub const DAY_PAGE: &str = "day";

/// Page name of a report's index within a report namespace.
pub const INDEX_PAGE: &str = "index";

/// Page name of the second and later index pages; its destination uses `{page}`.
pub const INDEX_CONTINUATION_PAGE: &str = "index_page";

/// An ordered list of segments identifying a template definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplatePath(Vec<String>);

impl TemplatePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl<const N: usize> From<[&str; N]> for TemplatePath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// The template file and destination pattern a path resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Template file, relative to the template root.
    pub template: String,
    /// Output location pattern with `{key}` placeholders.
    pub destination: String,
}

impl TemplateDefinition {
    pub fn new(template: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            destination: destination.into(),
        }
    }

    /// Formats the destination pattern with top-level values from `context`.
    pub fn destination_for(&self, context: &Value) -> Result<String, PublishError> {
        format_destination(&self.destination, context)
    }
}

/// A template path did not resolve to a definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot find template definition: {path}")]
pub struct LookupFailure {
    pub path: TemplatePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum TemplateNode {
    Leaf(TemplateDefinition),
    Branch(BTreeMap<String, TemplateNode>),
}

/// Nested template definitions, keyed by path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TemplateCatalog {
    root: BTreeMap<String, TemplateNode>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a path to its definition.
    ///
    /// Every segment must exist and the last one must name a definition; a
    /// path that stops on an inner node does not resolve.
    pub fn find(&self, path: &TemplatePath) -> Result<&TemplateDefinition, LookupFailure> {
        let not_found = || LookupFailure { path: path.clone() };
        let (last, parents) = path.segments().split_last().ok_or_else(not_found)?;

        let mut level = &self.root;
        for segment in parents {
            match level.get(segment) {
                Some(TemplateNode::Branch(children)) => level = children,
                _ => {
                    tracing::debug!(%path, %segment, "template path segment not found");
                    return Err(not_found());
                }
            }
        }

        match level.get(last) {
            Some(TemplateNode::Leaf(definition)) => Ok(definition),
            _ => {
                tracing::debug!(%path, segment = %last, "template path segment not found");
                Err(not_found())
            }
        }
    }

    pub fn contains(&self, path: &TemplatePath) -> bool {
        self.find(path).is_ok()
    }

    /// Adds a definition, creating intermediate levels as needed.
    ///
    /// A definition sitting where an intermediate level is required is replaced.
    pub fn insert(&mut self, path: &TemplatePath, definition: TemplateDefinition) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };

        let mut level = &mut self.root;
        for segment in parents {
            let node = level
                .entry(segment.clone())
                .or_insert_with(|| TemplateNode::Branch(BTreeMap::new()));
            if let TemplateNode::Leaf(_) = node {
                *node = TemplateNode::Branch(BTreeMap::new());
            }
            let TemplateNode::Branch(children) = node else {
                unreachable!("node was just made a branch");
            };
            level = children;
        }
        level.insert(last.clone(), TemplateNode::Leaf(definition));
    }

    #[must_use]
    pub fn with(mut self, path: impl Into<TemplatePath>, definition: TemplateDefinition) -> Self {
        self.insert(&path.into(), definition);
        self
    }
}

/// The day and index paths one report renders through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePaths {
    pub day: TemplatePath,
    pub index: TemplatePath,
    /// Layout for index pages after the first. Without it the index is a single page.
    pub index_continuation: Option<TemplatePath>,
}

impl PagePaths {
    /// Resolves `{report_id}/day`, `{report_id}/index` and the optional
    /// `{report_id}/index_page`, each falling back to the shared `simple`
    /// layout when the report does not define its own.
    pub fn resolve(catalog: &TemplateCatalog, report_id: &str) -> Result<Self, LookupFailure> {
        Ok(Self {
            day: resolve_page(catalog, report_id, DAY_PAGE)?,
            index: resolve_page(catalog, report_id, INDEX_PAGE)?,
            index_continuation: resolve_page(catalog, report_id, INDEX_CONTINUATION_PAGE).ok(),
        })
    }
}

fn resolve_page(
    catalog: &TemplateCatalog,
    report_id: &str,
    page: &str,
) -> Result<TemplatePath, LookupFailure> {
    let specific = TemplatePath::new([report_id, page]);
    if catalog.contains(&specific) {
        return Ok(specific);
    }

    let fallback = TemplatePath::new([SIMPLE_NAMESPACE, page]);
    catalog.find(&fallback)?;
    tracing::debug!(report = report_id, page, "using shared simple layout");
    Ok(fallback)
}

/// Replaces `{key}` placeholders with scalar values from the top level of `context`.
pub fn format_destination(pattern: &str, context: &Value) -> Result<String, PublishError> {
    let mut output = String::with_capacity(pattern.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let key = &caps[1];
        let value = match context.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
            _ => {
                return Err(PublishError::MissingContextKey {
                    pattern: pattern.to_string(),
                    key: key.to_string(),
                });
            }
        };
        output.push_str(&pattern[last..whole.start()]);
        output.push_str(&value);
        last = whole.end();
    }
    output.push_str(&pattern[last..]);

    Ok(output)
}
