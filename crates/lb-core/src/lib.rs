//! Core pipeline of the logbook publisher.
//!
//! This crate contains:
//! - Entries: timestamped log records and their metadata
//! - The event bus that carries a run from `Begin` to `BuildMaster`
//! - Aggregators: per-report day grouping, linking and index statistics
//! - The report registry and the master index
//! - Template path resolution and the `Publisher` seam used to render pages

mod aggregate;
pub mod bus;
pub mod entry;
mod error;
pub mod pipeline;
pub mod preprocess;
pub mod publisher;
mod registry;
pub mod report;
pub mod template;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregator, INDEX_PAGE_SIZE};
pub use bus::{Event, EventBus, Topic};
pub use entry::{ContentKind, Entry, EntryError};
pub use error::PipelineError;
pub use pipeline::{Day, RunSummary, run};
pub use preprocess::{PreprocessWarning, Preprocessor, format_duration};
pub use publisher::{PublishError, Publisher};
pub use registry::ReportRegistry;
pub use report::{DayReport, IndexStats, Report, ReportDefinition};
pub use template::{LookupFailure, PagePaths, TemplateCatalog, TemplateDefinition, TemplatePath};
