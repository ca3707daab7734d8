//! Input and output for GuideLLM report generation.
//!
//! This crate sits at the edges of the pipeline: it reads the raw
//! benchmark document and renders the records the core produces.
//!
//! # Quick Start
//!
//! ```no_run
//! use guidellm_report_core::{process, RunIdentity};
//! use guidellm_report_output::{read_document, render_json, write_output};
//!
//! let document = read_document("benchmarks.json")?;
//! let records = process(&document, &RunIdentity::new("uuid", "job"))?;
//! write_output(&render_json(&records)?, None)?;
//! # Ok::<(), guidellm_report_core::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`io`] - Reading documents, writing rendered output
//! - [`markdown`] - Markdown summary reports

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;

pub use io::{parse_document, read_document, render_json, write_output, DEFAULT_RESULTS_FILE};
pub use markdown::render_summary;

use guidellm_report_core::{OutputRecord, Result};

/// Output format of the rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of all records
    #[default]
    Json,
    /// Markdown table of the summary record
    Markdown,
}

/// Render records in the requested format.
pub fn render(records: &[OutputRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(records),
        OutputFormat::Markdown => {
            let timeseries_len = records.len().saturating_sub(1);
            Ok(records
                .first()
                .and_then(OutputRecord::as_summary)
                .map(|summary| render_summary(summary, timeseries_len))
                .unwrap_or_default())
        }
    }
}
