//! New command: writes an entry skeleton into the log directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Local, Timelike};
use lb_core::{ContentKind, Entry};
use serde::Serialize;

/// Values for a new entry.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub activities: Vec<String>,
    pub title: Option<String>,
    pub at: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

#[derive(Serialize)]
struct Frontmatter<'a> {
    time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
    activities: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

/// Location of an entry starting at `at`: `YYYY/MM/DD/HHMMSS.md`.
pub fn entry_path(log_root: &Path, at: DateTime<FixedOffset>) -> PathBuf {
    log_root
        .join(at.format("%Y/%m/%d").to_string())
        .join(at.format("%H%M%S.md").to_string())
}

/// Renders the frontmatter block and an empty body.
pub fn render(entry: &NewEntry, at: DateTime<FixedOffset>) -> Result<String> {
    let frontmatter = Frontmatter {
        time: at.to_rfc3339(),
        end_time: entry.end.map(|end| end.to_rfc3339()),
        activities: &entry.activities,
        title: entry.title.as_deref(),
    };
    let toml = toml::to_string(&frontmatter).context("failed to serialize frontmatter")?;
    Ok(format!("+++\n{toml}+++\n\n"))
}

/// Runs the new command, returning the created file.
pub fn run<W: Write>(writer: &mut W, log_root: &Path, entry: &NewEntry) -> Result<PathBuf> {
    let at = entry.at.unwrap_or_else(|| {
        let now = Local::now().fixed_offset();
        now.with_nanosecond(0).unwrap_or(now)
    });
    let path = entry_path(log_root, at);

    // Validates the time range the same way the entry source will.
    let mut check = Entry::new(&path, ContentKind::Markdown, at);
    if let Some(end) = entry.end {
        check = check.with_end_timestamp(end)?;
    }
    tracing::debug!(path = %check.source().display(), "creating entry");

    let content = render(entry, at)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            bail!("{} already exists", path.display());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to create {}", path.display()));
        }
    };
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    writeln!(writer, "{}", path.display())?;
    Ok(path)
}
