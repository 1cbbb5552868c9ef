//! Derived metadata computed before reports see an entry.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::bus::{Event, EventBus, Topic};
use crate::entry::{ContentKind, DURATION_KEY, DURATION_TEXT_KEY, Entry};

/// Duration assumed for entries that do not record an end time.
pub fn default_duration() -> Duration {
    Duration::hours(1)
}

/// Non-fatal problems found while preprocessing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreprocessWarning {
    #[error("{} has no end time, assuming {}", file.display(), format_duration(*assumed))]
    MissingEndTime { file: PathBuf, assumed: Duration },
}

impl PreprocessWarning {
    /// Emits the warning through `tracing`.
    pub fn log(&self) {
        match self {
            Self::MissingEndTime { file, assumed } => tracing::warn!(
                file = %file.display(),
                "entry has no end time, assuming {}",
                format_duration(*assumed)
            ),
        }
    }
}

/// Available metadata preprocessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preprocessor {
    /// Time between start and end, in seconds and as text.
    Duration,
}

impl Preprocessor {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
        }
    }

    /// Enriches `entry`, returning a warning if a fallback value was used.
    ///
    /// Entries this preprocessor has already handled are left alone and
    /// produce no second warning.
    pub fn apply(self, entry: &mut Entry) -> Option<PreprocessWarning> {
        match self {
            Self::Duration => apply_duration(entry),
        }
    }

    /// Applies the preprocessor and logs the warning, if any.
    pub fn preprocess(self, entry: &mut Entry) {
        if let Some(warning) = self.apply(entry) {
            warning.log();
        }
    }

    /// Runs this preprocessor on every entry published for preprocessing.
    pub fn attach(self, bus: &EventBus) {
        bus.subscribe(Topic::PreprocessFile, move |event, _| {
            if let Event::PreprocessFile { entry } = event {
                self.preprocess(entry);
            }
            Ok(())
        });
    }
}

impl fmt::Display for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preprocessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duration" => Ok(Self::Duration),
            _ => Err(format!("unknown preprocessor: {s}")),
        }
    }
}

/// Records how long a markdown entry lasts.
///
/// Uses the end timestamp when there is one; otherwise assumes
/// [`default_duration`] and reports a [`PreprocessWarning::MissingEndTime`].
/// Does nothing when the entry already carries a duration.
pub fn apply_duration(entry: &mut Entry) -> Option<PreprocessWarning> {
    if entry.content_kind() != ContentKind::Markdown
        || entry.metadata().contains_key(DURATION_KEY)
    {
        return None;
    }

    let (duration, warning) = match entry.end_timestamp() {
        Some(end) => (end - entry.timestamp(), None),
        None => {
            let assumed = default_duration();
            (
                assumed,
                Some(PreprocessWarning::MissingEndTime {
                    file: entry.source().to_path_buf(),
                    assumed,
                }),
            )
        }
    };

    let metadata = entry.metadata_mut();
    metadata.insert(DURATION_KEY.to_string(), Value::from(duration.num_seconds()));
    metadata.insert(
        DURATION_TEXT_KEY.to_string(),
        Value::from(format_duration(duration)),
    );
    warning
}

/// Formats a duration as "Xh Ym" when at least an hour, otherwise "Ym".
///
/// Negative durations are shown as "0m".
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    if total_minutes < 0 {
        return "0m".to_string();
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
