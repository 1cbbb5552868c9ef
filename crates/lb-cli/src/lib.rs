//! Logbook CLI library.
//!
//! This crate provides the `lb` command line interface: configuration, the
//! filesystem entry source, warning capture and the subcommands.

mod cli;
pub mod commands;
mod config;
pub mod source;
pub mod warnings;

pub use cli::{Cli, Commands};
pub use config::{Config, ConfigError, LOCAL_CONFIG_FILE};
pub use warnings::{LoggingReport, WarningRecorder};
