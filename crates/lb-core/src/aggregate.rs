//! Day aggregation for one report definition.
//!
//! # Window
//!
//! An aggregator keeps at most two days in flight:
//!
//! - `current`: the day being filled.
//! - `pending_previous`: the latest earlier day that received entries but has
//!   not been published, because its `next` link is not known yet.
//!
//! When `current` accepts its first entry while a day is pending, the two are
//! linked and the pending day is published. Days without accepted entries are
//! never kept, so links always skip over them.
//!
//! # Ordering
//!
//! Entries must arrive in non-decreasing day order. Out-of-order delivery is
//! not detected and yields wrong links.
//!
//! # Index pages
//!
//! The index lists [`INDEX_PAGE_SIZE`] days per page when the catalog has an
//! `index_page` layout. The first page always goes through `index`, so the
//! master index keeps linking to the same place.

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value, json};

use crate::bus::{Event, EventBus, Topic};
use crate::entry::{ContentKind, Entry};
use crate::error::PipelineError;
use crate::publisher::Publisher;
use crate::report::{DayBuilder, DayReport, IndexStats, Report, ReportDefinition};
use crate::template::{LookupFailure, PagePaths};

/// Days listed on one index page.
pub const INDEX_PAGE_SIZE: usize = 15;

/// Builds the day pages and the index pages of one report.
pub struct Aggregator {
    definition: ReportDefinition,
    publisher: Rc<dyn Publisher>,
    current_year: i32,
    paths: OnceCell<PagePaths>,
    current: Option<DayBuilder>,
    pending_previous: Option<DayBuilder>,
    emitted: Vec<DayReport>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("definition", &self.definition.id)
            .field("current", &self.current.as_ref().map(DayBuilder::date))
            .field(
                "pending_previous",
                &self.pending_previous.as_ref().map(DayBuilder::date),
            )
            .field("emitted", &self.emitted.len())
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator; `current_year` stands in for empty reports' year range.
    pub fn new(
        definition: ReportDefinition,
        publisher: Rc<dyn Publisher>,
        current_year: i32,
    ) -> Self {
        Self {
            definition,
            publisher,
            current_year,
            paths: OnceCell::new(),
            current: None,
            pending_previous: None,
            emitted: Vec::new(),
        }
    }

    /// Subscribes the aggregator to the processing topics.
    ///
    /// The returned handle stays readable after the run, e.g. to inspect
    /// [`Aggregator::emitted`].
    pub fn attach(self, bus: &EventBus) -> Rc<RefCell<Self>> {
        let this = Rc::new(RefCell::new(self));

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::Begin, move |_, bus| {
            let report = handle.borrow().on_begin()?;
            bus.publish(Event::RegisterReport { report })
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::DayStart, move |event, _| {
            if let Event::DayStart { date } = event {
                handle.borrow_mut().on_day_start(*date);
            }
            Ok(())
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::PreprocessFile, move |event, _| {
            if let Event::PreprocessFile { entry } = event {
                handle.borrow().on_preprocess(entry);
            }
            Ok(())
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::ProcessFile, move |event, _| match event {
            Event::ProcessFile { entry } => handle.borrow_mut().on_process(Rc::clone(entry)),
            _ => Ok(()),
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::DayEnd, move |event, _| {
            if let Event::DayEnd { date } = event {
                handle.borrow_mut().on_day_end(*date);
            }
            Ok(())
        });

        let handle = Rc::clone(&this);
        bus.subscribe(Topic::End, move |_, _| {
            handle.borrow_mut().on_end().map(|_| ())
        });

        this
    }

    pub const fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    /// Day reports published so far, oldest first.
    pub fn emitted(&self) -> &[DayReport] {
        &self.emitted
    }

    /// Resolves the day and index template paths once per run.
    pub fn page_paths(&self) -> Result<&PagePaths, LookupFailure> {
        if let Some(paths) = self.paths.get() {
            return Ok(paths);
        }
        let paths = PagePaths::resolve(self.publisher.templates(), &self.definition.id)?;
        tracing::debug!(
            report = %self.definition.id,
            day = %paths.day,
            index = %paths.index,
            "resolved report template paths"
        );
        Ok(self.paths.get_or_init(|| paths))
    }

    /// Describes this report's index page for the registry.
    ///
    /// The index is announced even if it ends up without any days.
    pub fn on_begin(&self) -> Result<Report, PipelineError> {
        let paths = self.page_paths()?;
        Ok(Report::new(
            self.definition.name.clone(),
            self.definition.description.clone(),
            paths.index.clone(),
            self.id_context(),
        ))
    }

    pub fn on_day_start(&mut self, date: NaiveDate) {
        if let Some(current) = self.current.take() {
            if !current.is_empty() {
                self.pending_previous = Some(current);
            }
        }
        self.current = Some(DayBuilder::new(date));
    }

    /// Runs this report's own preprocessors on entries it accepts.
    pub fn on_preprocess(&self, entry: &mut Entry) {
        if self.definition.preprocessors.is_empty() || !self.definition.accepts(entry) {
            return;
        }
        for preprocessor in &self.definition.preprocessors {
            preprocessor.preprocess(entry);
        }
    }

    /// Collects an accepted entry and publishes the pending day once it can be linked.
    pub fn on_process(&mut self, entry: Rc<Entry>) -> Result<(), PipelineError> {
        if entry.content_kind() != ContentKind::Markdown || !self.definition.accepts(&entry) {
            return Ok(());
        }

        let date = entry.date();
        let current = self.current.get_or_insert_with(|| DayBuilder::new(date));
        current.push(entry);

        if let Some(mut previous) = self.pending_previous.take() {
            current.set_prev(previous.date());
            previous.set_next(current.date());
            self.emit_day(previous)?;
        }
        Ok(())
    }

    pub const fn on_day_end(&mut self, _date: NaiveDate) {}

    /// Publishes the last unpublished day and then the index page.
    pub fn on_end(&mut self) -> Result<IndexStats, PipelineError> {
        if let Some(previous) = self.pending_previous.take() {
            self.emit_day(previous)?;
        } else if let Some(current) = self.current.take() {
            if !current.is_empty() {
                self.emit_day(current)?;
            }
        }

        let stats = IndexStats::compute(&self.emitted, self.current_year);
        self.publish_index(stats)?;
        Ok(stats)
    }

    fn emit_day(&mut self, builder: DayBuilder) -> Result<(), PipelineError> {
        let report = builder.finalize();
        let path = self.page_paths()?.day.clone();

        let mut context = self.day_context(report.date());
        context.insert(
            "report".to_string(),
            json!({
                "date": report.date().to_string(),
                "entries": report.entries_context(),
                "entry_count": report.entries().len(),
                "prev": self.link(report.prev())?,
                "next": self.link(report.next())?,
            }),
        );
        context.insert("index_url".to_string(), Value::from(self.index_url()?));

        tracing::debug!(
            report = %self.definition.id,
            date = %report.date(),
            entries = report.entries().len(),
            "publishing day report"
        );
        self.publisher.publish(&path, Value::Object(context))?;
        self.emitted.push(report);
        Ok(())
    }

    fn publish_index(&self, stats: IndexStats) -> Result<(), PipelineError> {
        let paths = self.page_paths()?;

        let mut rows = Vec::with_capacity(self.emitted.len());
        for report in &self.emitted {
            let day_context = Value::Object(self.day_context(report.date()));
            rows.push(json!({
                "date": report.date().to_string(),
                "year": report.date().year(),
                "entry_count": report.entries().len(),
                "url": self.publisher.url_for(&paths.day, &day_context)?,
            }));
        }

        let pages: Vec<&[Value]> = match &paths.index_continuation {
            Some(_) if !rows.is_empty() => rows.chunks(INDEX_PAGE_SIZE).collect(),
            _ => vec![rows.as_slice()],
        };
        let page_count = pages.len();

        for (number, rows) in (1..).zip(pages) {
            let mut context = self.index_context(number);
            context.insert("reports".to_string(), Value::from(rows.to_vec()));
            context.insert("page_count".to_string(), Value::from(page_count));
            context.insert("prev_page".to_string(), self.page_link(number - 1)?);
            let next = if number < page_count { number + 1 } else { 0 };
            context.insert("next_page".to_string(), self.page_link(next)?);
            if let Value::Object(stats) = stats.to_context() {
                context.extend(stats);
            }

            let path = match &paths.index_continuation {
                Some(continuation) if number > 1 => continuation,
                _ => &paths.index,
            };
            tracing::debug!(
                report = %self.definition.id,
                page = number,
                days = rows.len(),
                "publishing report index"
            );
            self.publisher.publish(path, Value::Object(context))?;
        }
        Ok(())
    }

    /// Link to index page `number`, or null for page 0.
    fn page_link(&self, number: usize) -> Result<Value, PipelineError> {
        if number == 0 {
            return Ok(Value::Null);
        }
        let paths = self.page_paths()?;
        let url = match &paths.index_continuation {
            Some(continuation) if number > 1 => self
                .publisher
                .url_for(continuation, &Value::Object(self.index_context(number)))?,
            _ => self.index_url()?,
        };
        Ok(json!({ "number": number, "url": url }))
    }

    fn link(&self, date: Option<NaiveDate>) -> Result<Value, PipelineError> {
        let Some(date) = date else {
            return Ok(Value::Null);
        };
        let day_path = &self.page_paths()?.day;
        let url = self
            .publisher
            .url_for(day_path, &Value::Object(self.day_context(date)))?;
        Ok(json!({ "date": date.to_string(), "url": url }))
    }

    fn index_url(&self) -> Result<String, PipelineError> {
        let index_path = &self.page_paths()?.index;
        Ok(self
            .publisher
            .url_for(index_path, &Value::Object(self.id_context()))?)
    }

    fn id_context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("id".to_string(), Value::from(self.definition.id.clone()));
        context.insert("name".to_string(), Value::from(self.definition.name.clone()));
        context.insert(
            "description".to_string(),
            Value::from(self.definition.description.clone()),
        );
        context
    }

    /// Values an index page destination may use.
    fn index_context(&self, page: usize) -> Map<String, Value> {
        let mut context = self.id_context();
        context.insert("page".to_string(), Value::from(page));
        context
    }

    /// Values a day page destination may use.
    fn day_context(&self, date: NaiveDate) -> Map<String, Value> {
        let mut context = self.id_context();
        context.insert("date".to_string(), Value::from(date.to_string()));
        context.insert("year".to_string(), Value::from(format!("{:04}", date.year())));
        context.insert("month".to_string(), Value::from(format!("{:02}", date.month())));
        context.insert("day".to_string(), Value::from(format!("{:02}", date.day())));
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{self, Day};
    use crate::preprocess::Preprocessor;
    use crate::template::{TemplateCatalog, TemplateDefinition, TemplatePath};
    use crate::testing::RecordingPublisher;
    use chrono::{DateTime, Duration};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(ts: &str, activities: &[&str]) -> Entry {
        Entry::new(
            format!("{ts}.md"),
            ContentKind::Markdown,
            DateTime::parse_from_rfc3339(ts).unwrap(),
        )
        .with_activities(activities.iter().copied())
    }

    fn day(d: NaiveDate, entries: Vec<Entry>) -> Day {
        Day { date: d, entries }
    }

    fn run(
        definition: ReportDefinition,
        days: Vec<Day>,
    ) -> (Rc<RefCell<Aggregator>>, Rc<RecordingPublisher>) {
        let publisher = Rc::new(RecordingPublisher::simple());
        let bus = EventBus::new();
        let aggregator = Aggregator::new(definition, publisher.clone(), 2026).attach(&bus);
        pipeline::run(&bus, days).unwrap();
        (aggregator, publisher)
    }

    fn work() -> ReportDefinition {
        ReportDefinition::new("work", "Work", "Work activities").with_activities(["work"])
    }

    fn timeline() -> ReportDefinition {
        ReportDefinition::new("timeline", "Timeline", "All entries")
    }

    #[test]
    fn work_report_skips_empty_day_and_links_neighbours() {
        let days = vec![
            day(
                date(2021, 1, 1),
                vec![
                    entry("2021-01-01T09:00:00Z", &["work"]),
                    entry("2021-01-01T12:00:00Z", &["personal"]),
                ],
            ),
            day(date(2021, 1, 2), vec![]),
            day(date(2021, 1, 3), vec![entry("2021-01-03T09:00:00Z", &["work"])]),
        ];

        let (aggregator, publisher) = run(work(), days);
        let aggregator = aggregator.borrow();
        let emitted = aggregator.emitted();

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].date(), date(2021, 1, 1));
        assert_eq!(emitted[0].entries().len(), 1);
        assert_eq!(emitted[0].prev(), None);
        assert_eq!(emitted[0].next(), Some(date(2021, 1, 3)));
        assert_eq!(emitted[1].date(), date(2021, 1, 3));
        assert_eq!(emitted[1].entries().len(), 1);
        assert_eq!(emitted[1].prev(), Some(date(2021, 1, 1)));
        assert_eq!(emitted[1].next(), None);

        let index = publisher.last_page(&TemplatePath::from(["simple", "index"])).unwrap();
        let listed: Vec<_> = index["reports"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["date"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(listed, vec!["2021-01-01", "2021-01-03"]);
    }

    #[test]
    fn chain_links_every_non_empty_day() {
        let days: Vec<_> = (1..=5)
            .map(|d| {
                let entries = if d % 2 == 0 {
                    vec![]
                } else {
                    vec![entry(&format!("2021-03-0{d}T08:00:00Z"), &[])]
                };
                day(date(2021, 3, d), entries)
            })
            .collect();

        let (aggregator, _) = run(timeline(), days);
        let aggregator = aggregator.borrow();
        let dates: Vec<_> = aggregator.emitted().iter().map(DayReport::date).collect();
        assert_eq!(dates, vec![date(2021, 3, 1), date(2021, 3, 3), date(2021, 3, 5)]);

        for pair in aggregator.emitted().windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1].date()));
            assert_eq!(pair[1].prev(), Some(pair[0].date()));
        }
        assert_eq!(aggregator.emitted()[0].prev(), None);
        assert_eq!(aggregator.emitted()[2].next(), None);
    }

    #[test]
    fn day_is_published_when_next_day_gets_its_first_entry() {
        let publisher = Rc::new(RecordingPublisher::simple());
        let bus = EventBus::new();
        let aggregator = Aggregator::new(timeline(), publisher.clone(), 2026);
        let aggregator = aggregator.attach(&bus);

        bus.publish(Event::Begin).unwrap();
        bus.publish(Event::DayStart { date: date(2021, 1, 1) }).unwrap();
        let first = Rc::new(entry("2021-01-01T09:00:00Z", &[]));
        bus.publish(Event::ProcessFile { entry: &first }).unwrap();
        bus.publish(Event::DayStart { date: date(2021, 1, 2) }).unwrap();
        assert_eq!(publisher.page_count(), 0);

        let second = Rc::new(entry("2021-01-02T09:00:00Z", &[]));
        bus.publish(Event::ProcessFile { entry: &second }).unwrap();
        assert_eq!(publisher.page_count(), 1);
        assert_eq!(aggregator.borrow().emitted()[0].date(), date(2021, 1, 1));

        let third = Rc::new(entry("2021-01-02T10:00:00Z", &[]));
        bus.publish(Event::ProcessFile { entry: &third }).unwrap();
        assert_eq!(publisher.page_count(), 1);
    }

    #[test]
    fn entries_sorted_when_published() {
        let days = vec![day(
            date(2021, 1, 1),
            vec![
                entry("2021-01-01T18:00:00Z", &[]),
                entry("2021-01-01T07:00:00Z", &[]),
                entry("2021-01-01T12:00:00Z", &[]),
            ],
        )];

        let (aggregator, publisher) = run(timeline(), days);
        let aggregator = aggregator.borrow();
        let times: Vec<_> = aggregator.emitted()[0]
            .entries()
            .iter()
            .map(|e| e.timestamp().format("%H").to_string())
            .collect();
        assert_eq!(times, vec!["07", "12", "18"]);

        let page = publisher.last_page(&TemplatePath::from(["simple", "day"])).unwrap();
        assert_eq!(page["report"]["entries"][0]["time"], "07:00");
    }

    #[test]
    fn day_page_context_links_neighbours_by_url() {
        let days = vec![
            day(date(2021, 1, 1), vec![entry("2021-01-01T09:00:00Z", &[])]),
            day(date(2021, 1, 3), vec![entry("2021-01-03T09:00:00Z", &[])]),
        ];

        let (_, publisher) = run(timeline(), days);
        let pages = publisher.pages(&TemplatePath::from(["simple", "day"]));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["report"]["prev"], Value::Null);
        assert_eq!(
            pages[0]["report"]["next"],
            json!({"date": "2021-01-03", "url": "/timeline/2021-01-03.html"})
        );
        assert_eq!(
            pages[1]["report"]["prev"]["url"],
            "/timeline/2021-01-01.html"
        );
        assert_eq!(pages[1]["index_url"], "/timeline/index.html");
        assert_eq!(pages[1]["id"], "timeline");
    }

    #[test]
    fn non_markdown_entries_are_ignored() {
        let photo = Entry::new(
            "photo.jpg",
            ContentKind::Other,
            DateTime::parse_from_rfc3339("2021-01-01T09:00:00Z").unwrap(),
        );
        let (aggregator, _) = run(timeline(), vec![day(date(2021, 1, 1), vec![photo])]);
        assert!(aggregator.borrow().emitted().is_empty());
    }

    #[test]
    fn empty_run_publishes_index_with_current_year() {
        let (aggregator, publisher) = run(work(), vec![]);
        assert!(aggregator.borrow().emitted().is_empty());

        let index = publisher.last_page(&TemplatePath::from(["simple", "index"])).unwrap();
        assert_eq!(index["max_entries"], 0);
        assert_eq!(index["min_year"], 2026);
        assert_eq!(index["max_year"], 2026);
        assert_eq!(index["reports"], json!([]));
    }

    #[test]
    fn index_statistics_cover_emitted_days() {
        let days = vec![
            day(
                date(2020, 6, 1),
                vec![
                    entry("2020-06-01T09:00:00Z", &[]),
                    entry("2020-06-01T10:00:00Z", &[]),
                    entry("2020-06-01T11:00:00Z", &[]),
                ],
            ),
            day(date(2021, 6, 1), vec![entry("2021-06-01T09:00:00Z", &[])]),
            day(
                date(2022, 6, 1),
                (9..14)
                    .map(|h| entry(&format!("2022-06-01T{h:02}:00:00Z"), &[]))
                    .collect(),
            ),
        ];

        let (_, publisher) = run(timeline(), days);
        let index = publisher.last_page(&TemplatePath::from(["simple", "index"])).unwrap();
        assert_eq!(index["max_entries"], 5);
        assert_eq!(index["min_year"], 2020);
        assert_eq!(index["max_year"], 2022);
        assert_eq!(index["reports"][2]["url"], "/timeline/2022-06-01.html");
    }

    fn daily_entries(days: u32) -> Vec<Day> {
        (1..=days)
            .map(|d| {
                let entries = vec![entry(&format!("2021-01-{d:02}T09:00:00Z"), &[])];
                day(date(2021, 1, d), entries)
            })
            .collect()
    }

    #[test]
    fn index_is_split_into_pages() {
        let catalog = RecordingPublisher::simple_catalog().with(
            ["simple", "index_page"],
            TemplateDefinition::new("simple/index.html", "{id}/page/{page}.html"),
        );
        let publisher = Rc::new(RecordingPublisher::new(catalog));
        let bus = EventBus::new();
        Aggregator::new(timeline(), publisher.clone(), 2026).attach(&bus);
        pipeline::run(&bus, daily_entries(16)).unwrap();

        let first = publisher.pages(&TemplatePath::from(["simple", "index"]));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["reports"].as_array().unwrap().len(), INDEX_PAGE_SIZE);
        assert_eq!(first[0]["page"], 1);
        assert_eq!(first[0]["page_count"], 2);
        assert_eq!(first[0]["prev_page"], Value::Null);
        assert_eq!(
            first[0]["next_page"],
            json!({"number": 2, "url": "/timeline/page/2.html"})
        );
        assert_eq!(first[0]["max_entries"], 1);

        let rest = publisher.pages(&TemplatePath::from(["simple", "index_page"]));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["reports"], json!([{
            "date": "2021-01-16",
            "year": 2021,
            "entry_count": 1,
            "url": "/timeline/2021-01-16.html"
        }]));
        assert_eq!(rest[0]["page"], 2);
        assert_eq!(rest[0]["prev_page"]["url"], "/timeline/index.html");
        assert_eq!(rest[0]["next_page"], Value::Null);
    }

    #[test]
    fn index_without_continuation_layout_is_one_page() {
        let (_, publisher) = run(timeline(), daily_entries(16));

        let pages = publisher.pages(&TemplatePath::from(["simple", "index"]));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["reports"].as_array().unwrap().len(), 16);
        assert_eq!(pages[0]["page_count"], 1);
        assert_eq!(pages[0]["next_page"], Value::Null);
    }

    #[test]
    fn begin_registers_index_even_when_empty() {
        let publisher = Rc::new(RecordingPublisher::simple());
        let bus = EventBus::new();
        let registered = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&registered);
        bus.subscribe(Topic::RegisterReport, move |event, _| {
            if let Event::RegisterReport { report } = event {
                sink.borrow_mut().push(report.clone());
            }
            Ok(())
        });
        Aggregator::new(work(), publisher, 2026).attach(&bus);

        bus.publish(Event::Begin).unwrap();

        let registered = registered.borrow();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].name, "Work");
        assert_eq!(registered[0].path, TemplatePath::from(["simple", "index"]));
        assert_eq!(registered[0].path_context["id"], "work");
    }

    #[test]
    fn report_specific_templates_take_precedence() {
        let catalog = RecordingPublisher::simple_catalog().with(
            ["work", "day"],
            TemplateDefinition::new("work/day.html", "work/days/{date}.html"),
        );
        let publisher = Rc::new(RecordingPublisher::new(catalog));
        let aggregator = Aggregator::new(work(), publisher, 2026);

        let paths = aggregator.page_paths().unwrap();
        assert_eq!(paths.day, TemplatePath::from(["work", "day"]));
        assert_eq!(paths.index, TemplatePath::from(["simple", "index"]));
    }

    #[test]
    fn missing_fallback_aborts_run() {
        let publisher = Rc::new(RecordingPublisher::new(TemplateCatalog::new()));
        let bus = EventBus::new();
        Aggregator::new(timeline(), publisher, 2026).attach(&bus);

        let err = pipeline::run(&bus, vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::Lookup(_)));
    }

    #[test]
    fn report_preprocessors_only_touch_accepted_entries() {
        let definition = work().with_preprocessors([Preprocessor::Duration]);
        let publisher = Rc::new(RecordingPublisher::simple());
        let aggregator = Aggregator::new(definition, publisher, 2026);

        let mut accepted = entry("2021-01-01T09:00:00Z", &["work"])
            .with_end_timestamp(DateTime::parse_from_rfc3339("2021-01-01T09:30:00Z").unwrap())
            .unwrap();
        let mut rejected = entry("2021-01-01T10:00:00Z", &["personal"]);
        aggregator.on_preprocess(&mut accepted);
        aggregator.on_preprocess(&mut rejected);

        assert_eq!(accepted.duration(), Some(Duration::minutes(30)));
        assert_eq!(rejected.duration(), None);
    }

    #[test]
    fn end_without_pending_flushes_current_day() {
        let publisher = Rc::new(RecordingPublisher::simple());
        let mut aggregator = Aggregator::new(timeline(), publisher.clone(), 2026);

        aggregator.on_day_start(date(2021, 1, 1));
        aggregator
            .on_process(Rc::new(entry("2021-01-01T09:00:00Z", &[])))
            .unwrap();
        aggregator.on_day_start(date(2021, 1, 2));
        let stats = aggregator.on_end().unwrap();

        assert_eq!(aggregator.emitted().len(), 1);
        assert_eq!(aggregator.emitted()[0].date(), date(2021, 1, 1));
        assert_eq!(stats.max_entries, 1);
        assert_eq!(publisher.page_count(), 2);
    }
}
