//! Collects registered reports and builds the master index.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

use crate::bus::{Event, EventBus, Topic};
use crate::error::PipelineError;
use crate::publisher::Publisher;
use crate::report::Report;
use crate::template::{INDEX_PAGE, TemplatePath};

/// Append-only list of reports announced during a run.
pub struct ReportRegistry {
    publisher: Rc<dyn Publisher>,
    reports: Vec<Report>,
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("reports", &self.reports)
            .finish_non_exhaustive()
    }
}

impl ReportRegistry {
    pub fn new(publisher: Rc<dyn Publisher>) -> Self {
        Self {
            publisher,
            reports: Vec::new(),
        }
    }

    /// Listens for registrations and for the master index build.
    pub fn attach(self, bus: &EventBus) -> Rc<RefCell<Self>> {
        let this = Rc::new(RefCell::new(self));

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::RegisterReport, move |event, _| {
            if let Event::RegisterReport { report } = event {
                handle.borrow_mut().register(report.clone());
            }
            Ok(())
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::BuildMaster, move |_, _| handle.borrow().build_master());

        this
    }

    pub fn register(&mut self, report: Report) {
        tracing::debug!(name = %report.name, path = %report.path, "registered report");
        self.reports.push(report);
    }

    /// Reports in registration order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Publishes the `index` page listing every registered report.
    pub fn build_master(&self) -> Result<(), PipelineError> {
        let mut listed = Vec::with_capacity(self.reports.len());
        for report in &self.reports {
            let url = self
                .publisher
                .url_for(&report.path, &Value::Object(report.path_context.clone()))?;
            listed.push(json!({
                "name": report.name,
                "description": report.description,
                "url": url,
            }));
        }

        tracing::debug!(reports = listed.len(), "publishing master index");
        self.publisher
            .publish(&TemplatePath::from([INDEX_PAGE]), json!({ "reports": listed }))?;
        Ok(())
    }
}
