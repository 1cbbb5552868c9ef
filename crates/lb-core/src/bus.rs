//! Synchronous, topic-keyed event dispatch.
//!
//! Listeners run in subscription order, on the publishing call stack. A listener
//! may publish further events; those are delivered completely before the outer
//! publish moves on to its next listener. The first listener error stops
//! delivery and is returned to whoever published.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::entry::Entry;
use crate::error::PipelineError;
use crate::report::Report;

/// Names of the events flowing through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Before any file is processed.
    Begin,
    /// A calendar day starts; it may turn out to have no entries.
    DayStart,
    /// Metadata enrichment for one entry. Not for building reports.
    PreprocessFile,
    /// One entry is ready to be collected into reports.
    ProcessFile,
    /// The day is closed; no more entries for it will arrive.
    DayEnd,
    /// Every file has been processed.
    End,
    /// A report announces its index page.
    RegisterReport,
    /// All reports are complete; build the master index.
    BuildMaster,
}

impl Topic {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "processing.begin",
            Self::DayStart => "processing.day_start",
            Self::PreprocessFile => "processing.preprocess_file",
            Self::ProcessFile => "processing.process_file",
            Self::DayEnd => "processing.day_end",
            Self::End => "processing.end",
            Self::RegisterReport => "reporting.register_report",
            Self::BuildMaster => "reporting.build_master",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its payload.
///
/// Entries are borrowed from the publisher: mutably while they are being
/// preprocessed, shared once they are handed to reports.
#[derive(Debug)]
pub enum Event<'a> {
    Begin,
    DayStart { date: NaiveDate },
    PreprocessFile { entry: &'a mut Entry },
    ProcessFile { entry: &'a Rc<Entry> },
    DayEnd { date: NaiveDate },
    End,
    RegisterReport { report: Report },
    BuildMaster,
}

impl Event<'_> {
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Begin => Topic::Begin,
            Self::DayStart { .. } => Topic::DayStart,
            Self::PreprocessFile { .. } => Topic::PreprocessFile,
            Self::ProcessFile { .. } => Topic::ProcessFile,
            Self::DayEnd { .. } => Topic::DayEnd,
            Self::End => Topic::End,
            Self::RegisterReport { .. } => Topic::RegisterReport,
            Self::BuildMaster => Topic::BuildMaster,
        }
    }
}

/// A subscribed callback.
pub type Listener = Rc<dyn Fn(&mut Event<'_>, &EventBus) -> Result<(), PipelineError>>;

/// In-process dispatcher from topics to ordered listener lists.
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<HashMap<Topic, Vec<Listener>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let mut counts: Vec<_> = listeners
            .iter()
            .map(|(topic, list)| (topic.as_str(), list.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `topic`.
    ///
    /// Subscribing from inside a listener is allowed; the new listener sees
    /// events published after the current delivery finishes.
    pub fn subscribe<F>(&self, topic: Topic, listener: F)
    where
        F: Fn(&mut Event<'_>, &Self) -> Result<(), PipelineError> + 'static,
    {
        self.listeners
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push(Rc::new(listener));
    }

    /// Delivers `event` to every listener of its topic, in subscription order.
    pub fn publish(&self, mut event: Event<'_>) -> Result<(), PipelineError> {
        let topic = event.topic();
        // Snapshot so listeners can publish or subscribe without a borrow conflict.
        let listeners = self
            .listeners
            .borrow()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(&mut event, self)?;
        }
        Ok(())
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.listeners.borrow().get(&topic).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{LookupFailure, TemplatePath};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(
        log: &Log,
        label: &'static str,
    ) -> impl Fn(&mut Event<'_>, &EventBus) -> Result<(), PipelineError> + 'static {
        let log = Rc::clone(log);
        move |event, _| {
            log.borrow_mut().push(format!("{label}:{}", event.topic()));
            Ok(())
        }
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::new();
        let log = Log::default();
        bus.subscribe(Topic::Begin, recorder(&log, "first"));
        bus.subscribe(Topic::Begin, recorder(&log, "second"));
        bus.subscribe(Topic::End, recorder(&log, "other"));

        bus.publish(Event::Begin).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["first:processing.begin", "second:processing.begin"]
        );
    }

    #[test]
    fn nested_publish_completes_before_outer_continues() {
        let bus = EventBus::new();
        let log = Log::default();

        let outer = Rc::clone(&log);
        bus.subscribe(Topic::Begin, move |_, bus| {
            outer.borrow_mut().push("begin:enter".to_string());
            bus.publish(Event::BuildMaster)?;
            outer.borrow_mut().push("begin:exit".to_string());
            Ok(())
        });
        bus.subscribe(Topic::Begin, recorder(&log, "later"));
        bus.subscribe(Topic::BuildMaster, recorder(&log, "nested"));

        bus.publish(Event::Begin).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "begin:enter",
                "nested:reporting.build_master",
                "begin:exit",
                "later:processing.begin",
            ]
        );
    }

    #[test]
    fn listener_error_stops_delivery() {
        let bus = EventBus::new();
        let log = Log::default();
        bus.subscribe(Topic::End, |_, _| {
            Err(LookupFailure {
                path: TemplatePath::from(["simple", "index"]),
            }
            .into())
        });
        bus.subscribe(Topic::End, recorder(&log, "after"));

        let err = bus.publish(Event::End).unwrap_err();

        assert!(matches!(err, PipelineError::Lookup(_)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn preprocess_listeners_can_mutate_entries() {
        use crate::entry::{ContentKind, Entry};
        use chrono::DateTime;

        let bus = EventBus::new();
        bus.subscribe(Topic::PreprocessFile, |event, _| {
            if let Event::PreprocessFile { entry } = event {
                entry
                    .metadata_mut()
                    .insert("seen".to_string(), serde_json::Value::Bool(true));
            }
            Ok(())
        });

        let mut entry = Entry::new(
            "a.md",
            ContentKind::Markdown,
            DateTime::parse_from_rfc3339("2021-01-01T09:00:00Z").unwrap(),
        );
        bus.publish(Event::PreprocessFile { entry: &mut entry })
            .unwrap();

        assert_eq!(entry.metadata()["seen"], serde_json::Value::Bool(true));
    }

    #[test]
    fn subscribing_during_delivery_applies_to_later_events() {
        let bus = EventBus::new();
        let log = Log::default();
        let inner = Rc::clone(&log);
        bus.subscribe(Topic::DayStart, move |_, bus| {
            bus.subscribe(Topic::DayStart, recorder(&inner, "late"));
            Ok(())
        });

        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        bus.publish(Event::DayStart { date }).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count(Topic::DayStart), 2);

        bus.publish(Event::DayStart { date }).unwrap();
        assert_eq!(*log.borrow(), vec!["late:processing.day_start"]);
    }
}
