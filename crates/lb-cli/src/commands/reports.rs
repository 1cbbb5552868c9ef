//! Reports command for listing the configured report definitions.

use std::fmt::Write as _;

use anyhow::Result;
use lb_core::ReportDefinition;

/// Formats report definitions as aligned text.
pub fn format_reports(reports: &[ReportDefinition]) -> String {
    let mut output = String::new();
    if reports.is_empty() {
        output.push_str("No reports configured.\n");
        return output;
    }

    let id_width = reports.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let name_width = reports.iter().map(|r| r.name.len()).max().unwrap_or(0);

    for report in reports {
        let activities = if report.accepts_all() {
            "(all)".to_string()
        } else {
            report
                .activities
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = write!(
            output,
            "{:<id_width$}  {:<name_width$}  {activities}",
            report.id, report.name
        );
        if !report.preprocessors.is_empty() {
            let names: Vec<_> = report.preprocessors.iter().map(|p| p.as_str()).collect();
            let _ = write!(output, "  [{}]", names.join(", "));
        }
        if !report.description.is_empty() {
            let _ = write!(output, "  {}", report.description);
        }
        output.push('\n');
    }
    output
}

pub fn format_reports_json(reports: &[ReportDefinition]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

/// Runs the reports command.
pub fn run(reports: &[ReportDefinition], json: bool) -> Result<()> {
    if json {
        println!("{}", format_reports_json(reports)?);
    } else {
        print!("{}", format_reports(reports));
    }
    Ok(())
}
