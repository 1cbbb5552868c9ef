//! Drives one run through the event bus.

use std::rc::Rc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::bus::{Event, EventBus};
use crate::entry::Entry;
use crate::error::PipelineError;

/// One calendar day as delivered by an entry source. `entries` may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub date: NaiveDate,
    pub entries: Vec<Entry>,
}

impl Day {
    pub const fn new(date: NaiveDate, entries: Vec<Entry>) -> Self {
        Self { date, entries }
    }
}

/// Counts of what a run delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub days: usize,
    pub entries: usize,
}

/// Publishes the full event sequence for `days`.
///
/// `days` must be in ascending date order. Each entry is preprocessed before
/// it is handed to reports, and the master index is built after `End`.
pub fn run<I>(bus: &EventBus, days: I) -> Result<RunSummary, PipelineError>
where
    I: IntoIterator<Item = Day>,
{
    let mut summary = RunSummary::default();
    bus.publish(Event::Begin)?;

    for Day { date, entries } in days {
        tracing::trace!(%date, entries = entries.len(), "day start");
        bus.publish(Event::DayStart { date })?;

        for mut entry in entries {
            bus.publish(Event::PreprocessFile { entry: &mut entry })?;
            let entry = Rc::new(entry);
            bus.publish(Event::ProcessFile { entry: &entry })?;
            summary.entries += 1;
        }

        bus.publish(Event::DayEnd { date })?;
        summary.days += 1;
    }

    bus.publish(Event::End)?;
    bus.publish(Event::BuildMaster)?;

    tracing::debug!(days = summary.days, entries = summary.entries, "run finished");
    Ok(summary)
}
