//! Report definitions and the day reports built for them.

use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::entry::{ContentKind, Entry};
use crate::preprocess::Preprocessor;
use crate::template::TemplatePath;

/// Configuration of one logical report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Identifier, also the first segment of report-specific template paths.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Accepted activity tags. Empty accepts every entry.
    #[serde(default)]
    pub activities: BTreeSet<String>,
    /// Preprocessors applied only to entries this report accepts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preprocessors: Vec<Preprocessor>,
}

impl ReportDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            activities: BTreeSet::new(),
            preprocessors: Vec::new(),
        }
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
    pub fn with_preprocessors(
        mut self,
        preprocessors: impl IntoIterator<Item = Preprocessor>,
    ) -> Self {
        self.preprocessors = preprocessors.into_iter().collect();
        self
    }

    /// True when the report takes every entry regardless of tags.
    pub fn accepts_all(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn accepts_activities(&self, activities: &BTreeSet<String>) -> bool {
        self.accepts_all() || !self.activities.is_disjoint(activities)
    }

    /// Markdown entries whose tags pass the activity filter.
    pub fn accepts(&self, entry: &Entry) -> bool {
        entry.content_kind() == ContentKind::Markdown && self.accepts_activities(entry.activities())
    }
}

/// A report announced to the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub name: String,
    pub description: String,
    /// Template path of the report's index page.
    pub path: TemplatePath,
    /// Values needed to resolve the index page destination.
    pub path_context: Map<String, Value>,
}

impl Report {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        path: TemplatePath,
        path_context: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path,
            path_context,
        }
    }
}

/// A day report still collecting entries.
#[derive(Debug, Clone)]
pub struct DayBuilder {
    date: NaiveDate,
    entries: Vec<Rc<Entry>>,
    prev: Option<NaiveDate>,
    next: Option<NaiveDate>,
}

impl DayBuilder {
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
            prev: None,
            next: None,
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn push(&mut self, entry: Rc<Entry>) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn set_prev(&mut self, date: NaiveDate) {
        self.prev = Some(date);
    }

    pub const fn set_next(&mut self, date: NaiveDate) {
        self.next = Some(date);
    }

    /// Freezes the day, ordering entries by start time.
    ///
    /// The sort is stable, so entries sharing a timestamp keep arrival order.
    pub fn finalize(mut self) -> DayReport {
        self.entries.sort_by_key(|entry| entry.timestamp());
        DayReport {
            date: self.date,
            entries: self.entries,
            prev: self.prev,
            next: self.next,
        }
    }
}

/// One calendar day of accepted entries for a report, linked to its neighbours.
///
/// Links name the neighbouring day; the neighbouring report itself lives in the
/// aggregator that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    date: NaiveDate,
    entries: Vec<Rc<Entry>>,
    prev: Option<NaiveDate>,
    next: Option<NaiveDate>,
}

impl DayReport {
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[Rc<Entry>] {
        &self.entries
    }

    /// Closest earlier day with entries for the same report.
    pub const fn prev(&self) -> Option<NaiveDate> {
        self.prev
    }

    /// Closest later day with entries for the same report.
    pub const fn next(&self) -> Option<NaiveDate> {
        self.next
    }

    pub fn entries_context(&self) -> Value {
        Value::Array(self.entries.iter().map(|entry| entry.to_context()).collect())
    }
}

/// Summary figures shown on a report index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Largest number of entries on any day, for sizing legends.
    pub max_entries: usize,
    pub min_year: i32,
    pub max_year: i32,
}

impl IndexStats {
    /// Computes the figures over `reports`, using `current_year` when there are none.
    pub fn compute(reports: &[DayReport], current_year: i32) -> Self {
        let max_entries = reports
            .iter()
            .map(|report| report.entries.len())
            .max()
            .unwrap_or(0);
        let years = reports.iter().map(|report| report.date.year());
        let min_year = years.clone().min().unwrap_or(current_year);
        let max_year = years.max().unwrap_or(current_year);

        Self {
            max_entries,
            min_year,
            max_year,
        }
    }

    pub fn to_context(self) -> Value {
        json!({
            "max_entries": self.max_entries,
            "min_year": self.min_year,
            "max_year": self.max_year,
        })
    }
}
