//! Log entries as delivered by an entry source.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Metadata key holding the entry duration in whole seconds.
pub const DURATION_KEY: &str = "duration";

/// Metadata key holding the human-readable entry duration.
pub const DURATION_TEXT_KEY: &str = "duration_text";

/// Errors raised while constructing an entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// The end timestamp lies before the start timestamp.
    #[error("entry ends at {end} before it starts at {start}")]
    EndBeforeStart {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

/// What kind of content an entry carries.
///
/// Only markdown entries take part in day reports; other files flow through
/// the pipeline so preprocessors can see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Markdown,
    Other,
}

impl ContentKind {
    /// Classifies a file by its extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                Self::Markdown
            }
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped log record.
///
/// The timestamps and activities are fixed at construction. Only the metadata
/// map may change afterwards, and only preprocessors are expected to touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    source: PathBuf,
    timestamp: DateTime<FixedOffset>,
    end_timestamp: Option<DateTime<FixedOffset>>,
    activities: BTreeSet<String>,
    content_kind: ContentKind,
    metadata: Map<String, Value>,
    body: String,
}

impl Entry {
    /// Creates an entry with no end time, no activities and an empty body.
    pub fn new(
        source: impl Into<PathBuf>,
        content_kind: ContentKind,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            source: source.into(),
            timestamp,
            end_timestamp: None,
            activities: BTreeSet::new(),
            content_kind,
            metadata: Map::new(),
            body: String::new(),
        }
    }

    /// Sets the end timestamp, rejecting one that precedes the start.
    pub fn with_end_timestamp(mut self, end: DateTime<FixedOffset>) -> Result<Self, EntryError> {
        if end < self.timestamp {
            return Err(EntryError::EndBeforeStart {
                start: self.timestamp,
                end,
            });
        }
        self.end_timestamp = Some(end);
        Ok(self)
    }

    #[must_use]
    pub fn with_activities<I, S>(mut self, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activities = activities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// The file this entry was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub const fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub const fn end_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.end_timestamp
    }

    /// The calendar day this entry belongs to, in the entry's own offset.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub const fn activities(&self) -> &BTreeSet<String> {
        &self.activities
    }

    pub const fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub const fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.metadata
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The duration recorded by the duration preprocessor, if it ran.
    pub fn duration(&self) -> Option<Duration> {
        self.metadata
            .get(DURATION_KEY)
            .and_then(Value::as_i64)
            .map(Duration::seconds)
    }

    /// Builds the mapping handed to templates for this entry.
    pub fn to_context(&self) -> Value {
        json!({
            "source": self.source.display().to_string(),
            "timestamp": self.timestamp.to_rfc3339(),
            "time": self.timestamp.format("%H:%M").to_string(),
            "end_timestamp": self.end_timestamp.map(|end| end.to_rfc3339()),
            "activities": self.activities,
            "content_kind": self.content_kind,
            "metadata": self.metadata,
            "body": self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn content_kind_from_extension() {
        assert_eq!(
            ContentKind::from_path(Path::new("log/2021/01/01/0900.md")),
            ContentKind::Markdown
        );
        assert_eq!(
            ContentKind::from_path(Path::new("notes.MARKDOWN")),
            ContentKind::Markdown
        );
        assert_eq!(
            ContentKind::from_path(Path::new("photo.jpg")),
            ContentKind::Other
        );
        assert_eq!(ContentKind::from_path(Path::new("README")), ContentKind::Other);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let entry = Entry::new("a.md", ContentKind::Markdown, at("2021-01-01T10:00:00Z"));
        let err = entry
            .with_end_timestamp(at("2021-01-01T09:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, EntryError::EndBeforeStart { .. }));
    }

    #[test]
    fn end_equal_to_start_is_allowed() {
        let entry = Entry::new("a.md", ContentKind::Markdown, at("2021-01-01T10:00:00Z"))
            .with_end_timestamp(at("2021-01-01T10:00:00Z"))
            .unwrap();
        assert_eq!(entry.end_timestamp(), Some(at("2021-01-01T10:00:00Z")));
    }

    #[test]
    fn date_uses_entry_offset() {
        // 23:30 at -05:00 is already the next day in UTC
        let entry = Entry::new("a.md", ContentKind::Markdown, at("2021-01-01T23:30:00-05:00"));
        assert_eq!(entry.date(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn duration_reads_metadata_seconds() {
        let mut entry = Entry::new("a.md", ContentKind::Markdown, at("2021-01-01T10:00:00Z"));
        assert_eq!(entry.duration(), None);
        entry
            .metadata_mut()
            .insert(DURATION_KEY.to_string(), Value::from(5400));
        assert_eq!(entry.duration(), Some(Duration::minutes(90)));
    }

    #[test]
    fn context_includes_time_and_activities() {
        let entry = Entry::new("a.md", ContentKind::Markdown, at("2021-01-01T09:05:00Z"))
            .with_activities(["work", "code"])
            .with_body("hello");
        let ctx = entry.to_context();
        assert_eq!(ctx["time"], "09:05");
        assert_eq!(ctx["activities"], json!(["code", "work"]));
        assert_eq!(ctx["content_kind"], "markdown");
        assert_eq!(ctx["body"], "hello");
        assert!(ctx["end_timestamp"].is_null());
    }
}
