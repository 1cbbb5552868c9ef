//! CLI subcommand implementations.

pub mod build;
pub mod new;
pub mod reports;
