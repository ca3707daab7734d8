//! The read → extract → write → index pipeline.

use crate::settings::Settings;
use anyhow::{Context, Result};
use guidellm_report_core::{process, OutputRecord};
use guidellm_report_output::{read_document, render, write_output};
use guidellm_report_sink::{IndexReport, OpenSearchSink, RecordSink};
use tracing::{info, warn};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Records produced, summary included
    pub records: usize,
    /// Result of indexing, when a sink was configured
    pub indexed: Option<IndexReport>,
}

/// Build the configured sink, if any.
pub fn configured_sink(settings: &Settings) -> Result<Option<OpenSearchSink>> {
    settings
        .sink_target()
        .map(|(server, index)| {
            OpenSearchSink::new(server, index).context("failed to configure OpenSearch sink")
        })
        .transpose()
}

/// Read the document and build its records.
pub fn build(settings: &Settings) -> Result<Vec<OutputRecord>> {
    let document = read_document(&settings.results)?;
    let records = process(&document, &settings.identity())?;
    Ok(records)
}

/// Run the whole pipeline.
///
/// Output is written before indexing. A sink failure is returned as an
/// error after the output is already in place.
pub async fn run_pipeline(settings: &Settings, sink: Option<&dyn RecordSink>) -> Result<RunOutcome> {
    info!(results = %settings.results.display(), "Parsing benchmark results");
    let records = build(settings)?;
    let rendered = render(&records, settings.format.into())?;
    write_output(&rendered, settings.output.as_deref())?;

    let indexed = match sink {
        Some(sink) => {
            let report = sink.index(&records).await.map_err(|e| {
                warn!(error = %e, "Indexing failed; output was still written");
                e
            });
            Some(report.context("failed to index records")?)
        }
        None => None,
    };

    Ok(RunOutcome {
        records: records.len(),
        indexed,
    })
}
