use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use lb_cli::commands::{build, new, reports};
use lb_cli::{Cli, Commands, Config, WarningRecorder};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let recorder = WarningRecorder::new();
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(recorder.clone())
        .try_init();

    match cli.command {
        Some(Commands::Build) => {
            let config = load_config(cli.config.as_deref())?;
            build::run(&mut std::io::stdout(), &config, &recorder)?;
        }
        Some(Commands::New {
            activities,
            title,
            at,
            end,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let entry = new::NewEntry {
                activities,
                title,
                at,
                end,
            };
            new::run(&mut std::io::stdout(), &config.log_root, &entry)?;
        }
        Some(Commands::Reports { json }) => {
            let config = load_config(cli.config.as_deref())?;
            reports::run(&config.reports, json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
