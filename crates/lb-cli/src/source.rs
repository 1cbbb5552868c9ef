//! Filesystem entry source.
//!
//! Markdown entries carry TOML frontmatter between `+++` lines:
//!
//! ```text
//! +++
//! time = "2021-01-01T09:00:00+01:00"
//! end_time = "2021-01-01T10:30:00+01:00"
//! activities = ["work"]
//! title = "Planning"
//! +++
//! Body in markdown.
//! ```
//!
//! `time` is required. Every key other than `time`, `end_time` and
//! `activities` ends up in the entry metadata.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use lb_core::{ContentKind, Day, Entry, EntryError};
use rayon::prelude::*;
use serde_json::{Map, Value};
use thiserror::Error;
use walkdir::WalkDir;

const DELIMITER: &str = "+++";

/// Why an entry file could not be loaded.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("log directory {} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: no `+++` frontmatter", path.display())]
    MissingFrontmatter { path: PathBuf },

    #[error("{}: invalid frontmatter: {source}", path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: missing required key `{key}`", path.display())]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("{}: `{key}` is not an RFC 3339 timestamp: {value}", path.display())]
    Timestamp {
        path: PathBuf,
        key: &'static str,
        value: String,
    },

    #[error("{}: `activities` must be a list of strings", path.display())]
    Activities { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Entry {
        path: PathBuf,
        #[source]
        source: EntryError,
    },
}

/// Loads every entry under `root`, skipping hidden files and unreadable entries.
pub fn scan(root: &Path) -> Result<Vec<Entry>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::MissingRoot {
            path: root.to_path_buf(),
        });
    }

    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    tracing::debug!(root = %root.display(), files = files.len(), "scanned log directory");

    let entries: Vec<Entry> = files
        .par_iter()
        .filter_map(|path| match load_entry(path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "skipping invalid entry");
                None
            }
        })
        .collect();

    Ok(entries)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Loads one file as an entry.
pub fn load_entry(path: &Path) -> Result<Entry, SourceError> {
    match ContentKind::from_path(path) {
        ContentKind::Markdown => {
            let content = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_markdown(path, &content)
        }
        ContentKind::Other => {
            let modified = std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map_err(|source| SourceError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            let timestamp = DateTime::<Local>::from(modified).fixed_offset();
            Ok(Entry::new(path, ContentKind::Other, timestamp))
        }
    }
}

/// Builds a markdown entry from file content.
pub fn parse_markdown(path: &Path, content: &str) -> Result<Entry, SourceError> {
    let (frontmatter, body) =
        split_frontmatter(content).ok_or_else(|| SourceError::MissingFrontmatter {
            path: path.to_path_buf(),
        })?;

    let mut table: toml::Table =
        toml::from_str(frontmatter).map_err(|source| SourceError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;

    let time = table.remove("time").ok_or_else(|| SourceError::MissingKey {
        path: path.to_path_buf(),
        key: "time",
    })?;
    let timestamp = parse_timestamp(path, "time", &time)?;

    let activities: Vec<String> = match table.remove("activities") {
        None => Vec::new(),
        Some(toml::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s),
                _ => Err(SourceError::Activities {
                    path: path.to_path_buf(),
                }),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(SourceError::Activities {
                path: path.to_path_buf(),
            });
        }
    };

    let end_time = table.remove("end_time");
    let metadata: Map<String, Value> = table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect();

    let mut entry = Entry::new(path, ContentKind::Markdown, timestamp)
        .with_activities(activities)
        .with_metadata(metadata)
        .with_body(body);

    if let Some(end) = end_time {
        let end = parse_timestamp(path, "end_time", &end)?;
        entry = entry
            .with_end_timestamp(end)
            .map_err(|source| SourceError::Entry {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(entry)
}

/// Splits `+++` delimited frontmatter from the body.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    if lines.next()?.trim_end() != DELIMITER {
        return None;
    }

    let start = content.find('\n')? + 1;
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let body = &content[offset + line.len()..];
            return Some((&content[start..offset], body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    None
}

/// Accepts quoted RFC 3339 strings as well as TOML offset datetimes.
fn parse_timestamp(
    path: &Path,
    key: &'static str,
    value: &toml::Value,
) -> Result<DateTime<FixedOffset>, SourceError> {
    let text = match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Datetime(dt) => dt.to_string(),
        other => other.to_string(),
    };
    DateTime::parse_from_rfc3339(&text).map_err(|_| SourceError::Timestamp {
        path: path.to_path_buf(),
        key,
        value: text,
    })
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// Groups entries into consecutive calendar days.
///
/// The range runs from the first to the last markdown entry, and every date in
/// it is present, empty or not. Other files only land on days inside that
/// range, so a stray attachment cannot stretch the log. Within a day entries
/// are ordered by timestamp, then by path.
pub fn into_days(entries: Vec<Entry>) -> Vec<Day> {
    let markdown_dates = entries
        .iter()
        .filter(|entry| entry.content_kind() == ContentKind::Markdown)
        .map(Entry::date);
    let (Some(first), Some(last)) = (markdown_dates.clone().min(), markdown_dates.max()) else {
        return Vec::new();
    };

    let mut by_date: BTreeMap<_, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        let date = entry.date();
        if date < first || date > last {
            tracing::debug!(
                path = %entry.source().display(),
                %date,
                "skipping file outside the logged days"
            );
            continue;
        }
        by_date.entry(date).or_default().push(entry);
    }

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let mut entries = by_date.remove(&date).unwrap_or_default();
            entries.sort_by(|a, b| {
                a.timestamp()
                    .cmp(&b.timestamp())
                    .then_with(|| a.source().cmp(b.source()))
            });
            Day::new(date, entries)
        })
        .collect()
}
