//! Configuration loading and management.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use lb_core::{Preprocessor, ReportDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Project-local configuration file, looked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "logbook.toml";

/// Problems with otherwise well-formed configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("report id must not be empty")]
    EmptyReportId,

    #[error("report id `{0}` is defined more than once")]
    DuplicateReportId(String),

    #[error("report id `{0}` must not contain path separators or `..`")]
    UnsafeReportId(String),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the entry files.
    pub log_root: PathBuf,
    /// Directory holding `templates.toml`, templates and static files.
    pub templates: PathBuf,
    /// Directory pages are written to.
    pub output: PathBuf,
    /// Prefix of every generated link.
    pub url_root: String,
    /// Free-form values exposed to templates as `site`.
    pub site: Map<String, Value>,
    /// Preprocessors run on every entry.
    pub preprocessors: Vec<Preprocessor>,
    pub reports: Vec<ReportDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_root: PathBuf::from("log"),
            templates: PathBuf::from("templates"),
            output: PathBuf::from("output"),
            url_root: "/".to_string(),
            site: Map::new(),
            preprocessors: vec![Preprocessor::Duration],
            reports: vec![ReportDefinition::new(
                "timeline",
                "Timeline",
                "List of all log entries",
            )],
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        figment = figment.merge(Toml::file(LOCAL_CONFIG_FILE));

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (LB_*)
        figment = figment.merge(Env::prefixed("LB_"));

        figment.extract()
    }

    /// Checks that report ids are present, unique and usable as a path segment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for report in &self.reports {
            if report.id.trim().is_empty() {
                return Err(ConfigError::EmptyReportId);
            }
            if report.id.contains(['/', '\\']) || report.id.contains("..") {
                return Err(ConfigError::UnsafeReportId(report.id.clone()));
            }
            if !seen.insert(report.id.as_str()) {
                return Err(ConfigError::DuplicateReportId(report.id.clone()));
            }
        }
        Ok(())
    }
}

/// Returns the platform-specific config directory for lb.
///
/// On Linux: `~/.config/logbook`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("logbook"))
}
