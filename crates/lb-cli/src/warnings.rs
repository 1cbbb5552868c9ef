//! Captures warnings raised during a build and publishes them as a report.

use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use lb_core::{Event, EventBus, PipelineError, Publisher, Report, TemplatePath, Topic};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// One captured `warn!` or `error!` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningRecord {
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Map<String, Value>,
}

/// A tracing layer that keeps every warning and error in memory.
///
/// Clones share the same buffer, so one clone can be installed in the
/// subscriber while another is handed to the logging report.
#[derive(Debug, Clone, Default)]
pub struct WarningRecorder {
    records: Arc<Mutex<Vec<WarningRecord>>>,
}

impl WarningRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<WarningRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, record: WarningRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl<S: Subscriber> Layer<S> for WarningRecorder {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::WARN {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.push(WarningRecord {
            level: metadata.level().as_str().to_lowercase(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

/// Visitor that extracts the message and fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(buf, "{value:?}");
        self.insert(field, Value::String(buf));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}

/// Page listing the warnings captured during the build.
pub struct LoggingReport {
    recorder: WarningRecorder,
    publisher: Rc<dyn Publisher>,
}

impl LoggingReport {
    pub const NAME: &'static str = "Logging";
    pub const DESCRIPTION: &'static str = "Collected warning messages";

    pub fn new(recorder: WarningRecorder, publisher: Rc<dyn Publisher>) -> Self {
        Self {
            recorder,
            publisher,
        }
    }

    pub fn path() -> TemplatePath {
        TemplatePath::from(["logging", "index"])
    }

    /// Registers the report at begin and publishes it with the master index.
    ///
    /// Does nothing when the template catalog has no `logging/index` page.
    /// Returns whether the report was attached.
    pub fn attach(self, bus: &EventBus) -> bool {
        if !self.publisher.templates().contains(&Self::path()) {
            tracing::debug!(path = %Self::path(), "no logging template, skipping warning report");
            return false;
        }

        bus.subscribe(Topic::Begin, |_, bus| {
            let mut context = Map::new();
            context.insert("id".to_string(), Value::from("logging"));
            bus.publish(Event::RegisterReport {
                report: Report::new(Self::NAME, Self::DESCRIPTION, Self::path(), context),
            })
        });

        bus.subscribe(Topic::BuildMaster, move |_, _| self.publish());
        true
    }

    fn publish(&self) -> Result<(), PipelineError> {
        let records = self.recorder.records();
        tracing::debug!(records = records.len(), "publishing warning report");
        self.publisher.publish(
            &Self::path(),
            json!({
                "id": "logging",
                "name": Self::NAME,
                "description": Self::DESCRIPTION,
                "records": records,
            }),
        )?;
        Ok(())
    }
}
