//! Jinja environment shared by every page of a run.
//!
//! Templates are read from the template root and fall back to the built-in
//! layouts. On top of the standard filters and functions, templates get:
//!
//! - `markdown` filter: converts an entry body to HTML.
//! - `url(path, **context)`: link to the page the template path (for example
//!   `"simple/day"`) produces for `context`.
//!
//! Templates whose name ends in `.html` are auto-escaped; `/` is left as is.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use lb_core::{TemplateCatalog, TemplatePath};
use minijinja::value::{Kwargs, Value};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, UndefinedBehavior};

use crate::{builtin, markdown};

/// Builds the environment for templates under `template_root`.
pub fn environment(
    template_root: PathBuf,
    catalog: TemplateCatalog,
    url_root: String,
) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_formatter(format_value);
    env.set_loader(move |name| load(&template_root, name));
    env.add_filter("markdown", markdown_filter);
    env.add_function("url", move |path: String, kwargs: Kwargs| {
        url(&catalog, &url_root, &path, &kwargs)
    });
    env
}

fn load(root: &Path, name: &str) -> Result<Option<String>, Error> {
    let path = root.join(name);
    match fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let source = builtin::source(name);
            if source.is_some() {
                tracing::debug!(template = name, "using built-in template");
            }
            Ok(source.map(str::to_string))
        }
        Err(err) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot read {}", path.display()),
        )
        .with_source(err)),
    }
}

fn markdown_filter(source: &str) -> Value {
    Value::from_safe_string(markdown::to_html(source))
}

fn url(
    catalog: &TemplateCatalog,
    url_root: &str,
    path: &str,
    kwargs: &Kwargs,
) -> Result<Value, Error> {
    let mut context = serde_json::Map::new();
    for key in kwargs.args() {
        let value: Value = kwargs.get(key)?;
        let value = serde_json::to_value(&value).map_err(|err| {
            Error::new(ErrorKind::InvalidOperation, format!("cannot use `{key}` in a link"))
                .with_source(err)
        })?;
        context.insert(key.to_string(), value);
    }

    let path = TemplatePath::new(path.split('/'));
    let destination = catalog
        .find(&path)
        .map_err(|err| Error::new(ErrorKind::InvalidOperation, err.to_string()))?
        .destination_for(&serde_json::Value::Object(context))
        .map_err(|err| Error::new(ErrorKind::InvalidOperation, err.to_string()))?;
    Ok(Value::from_safe_string(format!("{url_root}{destination}")))
}

fn format_value(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if let (AutoEscape::Html, Some(text)) = (state.auto_escape(), value.as_str()) {
        if !value.is_safe() {
            return out
                .write_str(&escape_html(text))
                .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write output"));
        }
    }
    minijinja::escape_formatter(out, state, value)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
