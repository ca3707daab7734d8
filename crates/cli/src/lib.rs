//! CLI for GuideLLM report generation.
//!
//! This crate provides the `guidellm-report` command: it reads a GuideLLM
//! benchmark results document, writes the summary and per-request records
//! as JSON (or a markdown summary), and optionally indexes the records into
//! OpenSearch.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod logging;
pub mod pipeline;
pub mod settings;

use anyhow::Result;
use clap::Parser;
use guidellm_report_sink::RecordSink;
use settings::{LogFormat, ReportFormat, Settings};
use std::path::PathBuf;
use tracing::info;

/// GuideLLM benchmark report CLI.
///
/// Every argument may also be set through a `GUIDELLM_REPORT_*` environment
/// variable or a config file; arguments take precedence.
#[derive(Parser, Debug, Default)]
#[command(name = "guidellm-report")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Benchmark results document (default: benchmarks.json).
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Run UUID stamped on every record.
    #[arg(long)]
    pub uuid: Option<String>,

    /// Job name stamped on every record.
    #[arg(short, long)]
    pub job_name: Option<String>,

    /// Output file; standard output when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// OpenSearch server URL.
    #[arg(long)]
    pub es_server: Option<String>,

    /// OpenSearch index name.
    #[arg(long)]
    pub es_index: Option<String>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Config file (TOML, YAML or JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log line format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` once the output is written and, when configured, the
/// records are indexed.
pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    logging::init(&settings.log_level, settings.log_format)?;

    let sink = pipeline::configured_sink(&settings)?;
    let outcome =
        pipeline::run_pipeline(&settings, sink.as_ref().map(|s| s as &dyn RecordSink)).await?;

    match outcome.indexed {
        Some(report) => info!(
            records = outcome.records,
            indexed = report.indexed,
            "Report written and indexed"
        ),
        None => info!(records = outcome.records, "Report written"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from([
            "guidellm-report",
            "--results",
            "out/benchmarks.json",
            "--uuid",
            "abc",
            "-j",
            "nightly",
            "-o",
            "report.json",
            "--format",
            "markdown",
            "--es-server",
            "http://search:9200",
            "--es-index",
            "guidellm",
        ]);
        assert_eq!(cli.results, Some(PathBuf::from("out/benchmarks.json")));
        assert_eq!(cli.uuid.as_deref(), Some("abc"));
        assert_eq!(cli.job_name.as_deref(), Some("nightly"));
        assert_eq!(cli.output, Some(PathBuf::from("report.json")));
        assert_eq!(cli.format, Some(ReportFormat::Markdown));
        assert_eq!(cli.es_server.as_deref(), Some("http://search:9200"));
        assert_eq!(cli.es_index.as_deref(), Some("guidellm"));
        assert_eq!(cli.log_format, None);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["guidellm-report", "--format", "csv"]).is_err());
    }
}
