//! Build command: renders every report into the output directory.

use std::io::Write;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use lb_core::{Aggregator, EventBus, ReportRegistry};
use lb_publish::FsPublisher;
use serde::Serialize;

use crate::warnings::{LoggingReport, WarningRecorder};
use crate::{Config, source};

/// What a build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub days: usize,
    pub entries: usize,
    pub pages: usize,
    pub static_files: usize,
    pub warnings: usize,
}

/// Runs the build command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    recorder: &WarningRecorder,
) -> Result<BuildSummary> {
    let summary = build(config, recorder, Local::now().year())?;

    writeln!(
        writer,
        "Built {} pages from {} entries over {} days into {}",
        summary.pages,
        summary.entries,
        summary.days,
        config.output.display()
    )?;
    if summary.static_files > 0 {
        writeln!(writer, "Copied {} static files", summary.static_files)?;
    }
    if summary.warnings > 0 {
        writeln!(
            writer,
            "{} warnings, run with --verbose for details",
            summary.warnings
        )?;
    }

    Ok(summary)
}

/// Scans the log, runs the pipeline and copies static files.
pub fn build(
    config: &Config,
    recorder: &WarningRecorder,
    current_year: i32,
) -> Result<BuildSummary> {
    config.validate().context("invalid report configuration")?;

    let publisher = Rc::new(
        FsPublisher::open(&config.templates, &config.output)
            .context("failed to load template configuration")?
            .with_url_root(config.url_root.clone())
            .with_site(config.site.clone()),
    );

    let entries = source::scan(&config.log_root)
        .with_context(|| format!("failed to scan {}", config.log_root.display()))?;
    let days = source::into_days(entries);

    let bus = EventBus::new();
    for preprocessor in &config.preprocessors {
        preprocessor.attach(&bus);
    }
    ReportRegistry::new(publisher.clone()).attach(&bus);
    for definition in &config.reports {
        Aggregator::new(definition.clone(), publisher.clone(), current_year).attach(&bus);
    }
    LoggingReport::new(recorder.clone(), publisher.clone()).attach(&bus);
    tracing::debug!(?bus, "pipeline wired");

    let run = lb_core::run(&bus, days).context("build failed")?;
    let static_files = publisher
        .copy_static_files()
        .context("failed to copy static files")?;

    Ok(BuildSummary {
        days: run.days,
        entries: run.entries,
        pages: publisher.pages_written(),
        static_files,
        warnings: recorder.len(),
    })
}
