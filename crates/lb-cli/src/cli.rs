//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};

/// File-based life log publisher.
///
/// Reads timestamped markdown entries from a log directory and renders
/// per-day and index pages for every configured report.
#[derive(Debug, Parser)]
#[command(name = "lb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render every report into the output directory.
    Build,

    /// Create a new entry file in the log directory.
    New {
        /// Activity tag (repeatable).
        #[arg(short, long = "activity")]
        activities: Vec<String>,

        /// Entry title, stored in the frontmatter.
        #[arg(short, long)]
        title: Option<String>,

        /// Start time (RFC 3339). Defaults to now.
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<DateTime<FixedOffset>>,

        /// End time (RFC 3339).
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<DateTime<FixedOffset>>,
    },

    /// List the configured reports.
    Reports {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| {
            format!("expected an RFC 3339 timestamp such as 2021-01-01T09:00:00+01:00 ({e})")
        })
}
