//! Layered run settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional config
//! file, `GUIDELLM_REPORT_*` environment variables, then command-line
//! arguments.

use crate::Cli;
use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File};
use guidellm_report_core::RunIdentity;
use guidellm_report_output::{OutputFormat, DEFAULT_RESULTS_FILE};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "GUIDELLM_REPORT";

/// Rendering of the output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// JSON array: summary followed by timeseries records
    #[default]
    Json,
    /// Markdown summary table
    Markdown,
}

impl ReportFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Markdown => OutputFormat::Markdown,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Resolved settings of one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Benchmark results document to read
    pub results: PathBuf,
    /// Run UUID stamped on every record
    pub uuid: String,
    /// Job name stamped on every record
    pub job_name: String,
    /// Output file; standard output when unset
    pub output: Option<PathBuf>,
    /// OpenSearch endpoint
    pub es_server: Option<String>,
    /// OpenSearch index
    pub es_index: Option<String>,
    /// Output rendering
    pub format: ReportFormat,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from all sources, reading the process environment.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_sources(cli, None)
    }

    /// Load settings with an explicit environment map instead of the
    /// process environment.
    pub fn from_sources(
        cli: &Cli,
        environment: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("results", DEFAULT_RESULTS_FILE)?
            .set_default("uuid", "")?
            .set_default("job_name", "")?
            .set_default("format", ReportFormat::default().as_str())?
            .set_default("log_level", "info")?
            .set_default("log_format", LogFormat::default().as_str())?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let env = Environment::with_prefix(ENV_PREFIX).source(environment);
        builder = builder
            .add_source(env)
            .set_override_option("results", cli.results.as_ref().map(|p| p.display().to_string()))?
            .set_override_option("uuid", cli.uuid.clone())?
            .set_override_option("job_name", cli.job_name.clone())?
            .set_override_option("output", cli.output.as_ref().map(|p| p.display().to_string()))?
            .set_override_option("es_server", cli.es_server.clone())?
            .set_override_option("es_index", cli.es_index.clone())?
            .set_override_option("format", cli.format.map(ReportFormat::as_str))?
            .set_override_option("log_level", cli.log_level.clone())?
            .set_override_option("log_format", cli.log_format.map(LogFormat::as_str))?;

        builder.build()?.try_deserialize()
    }

    /// Identifiers for the produced records.
    pub fn identity(&self) -> RunIdentity {
        RunIdentity::new(self.uuid.clone(), self.job_name.clone())
    }

    /// Server and index when both are configured and non-empty.
    pub fn sink_target(&self) -> Option<(&str, &str)> {
        let server = self.es_server.as_deref().filter(|s| !s.trim().is_empty())?;
        let index = self.es_index.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((server, index))
    }
}
