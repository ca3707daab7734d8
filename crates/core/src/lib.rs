// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metrics extraction for GuideLLM benchmark result documents.
//!
//! This crate turns one parsed benchmark document into a flat, stable set of
//! records: a single summary followed by one timeseries record per request.
//! It performs no I/O.
//!
//! # Quick Start
//!
//! ```
//! use guidellm_report_core::{process, RunIdentity};
//!
//! let document = serde_json::json!({
//!     "benchmarks": [{
//!         "requests": {
//!             "successful": [{"request_latency": 2.0, "output_tokens": 128}],
//!             "errored": [{}]
//!         }
//!     }]
//! });
//!
//! let records = process(&document, &RunIdentity::new("uuid", "job")).unwrap();
//! assert_eq!(records.len(), 3);
//! ```
//!
//! # Modules
//!
//! - [`navigator`] - Locating the benchmark section and request lists
//! - [`document`] - Typed, optional-field view of sections and samples
//! - [`stats`] - Mean and nearest-rank percentiles
//! - [`extractor`] - Per-request derivation and summary assembly
//! - [`record`] - The output record contract

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod extractor;
pub mod navigator;
pub mod record;
pub mod stats;

pub use document::{BenchmarkSection, RequestSample};
pub use error::{Error, Result};
pub use extractor::{build_records, extract, Extraction};
pub use navigator::navigate;
pub use record::{OutputRecord, RunIdentity, SummaryRecord, TimeseriesRecord};

use serde_json::Value;
use tracing::info;

/// Navigate a document and build its output records.
///
/// # Errors
///
/// Returns [`Error::SectionNotFound`] when the document holds no benchmark.
pub fn process(document: &Value, identity: &RunIdentity) -> Result<Vec<OutputRecord>> {
    let (section, samples) = navigate(document)?;
    let records = build_records(&section, &samples, identity);
    info!(
        uuid = %identity.uuid,
        job_name = %identity.job_name,
        records = records.len(),
        "Built benchmark records"
    );
    Ok(records)
}
