// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output records.
//!
//! Field names are a consumer-facing contract: dashboards and the search
//! index key on them verbatim. Undefined values serialize as `null` so
//! every record of a kind has the same set of keys.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identifiers supplied by the caller and stamped on every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Run UUID
    pub uuid: String,
    /// CI job name
    pub job_name: String,
}

impl RunIdentity {
    /// Create a new identity.
    pub fn new(uuid: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            job_name: job_name.into(),
        }
    }
}

/// Aggregate statistics of one benchmark run.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub uuid: String,
    pub job_name: String,
    pub timestamp: Option<String>,
    pub strategy: Option<String>,
    pub rate: Option<f64>,
    pub backend_model: Option<String>,

    pub total_requests: u64,
    pub successful_requests: u64,
    pub errored_requests: u64,
    pub incomplete_requests: u64,

    pub prompt_tokens: Option<u64>,
    pub output_tokens: Option<u64>,

    pub ttft_mean_ms: Option<f64>,
    pub ttft_p95_ms: Option<f64>,
    pub ttft_p99_ms: Option<f64>,

    pub itl_mean_ms: Option<f64>,
    pub itl_p95_ms: Option<f64>,
    pub itl_p99_ms: Option<f64>,

    pub throughput_mean_rps: Option<f64>,
    pub throughput_p95_rps: Option<f64>,
    pub throughput_p99_rps: Option<f64>,

    pub request_latency_mean_seconds: Option<f64>,
    pub request_latency_p95_seconds: Option<f64>,
    pub request_latency_p99_seconds: Option<f64>,

    pub tokens_per_second_mean: Option<f64>,
    pub tokens_per_second_p95: Option<f64>,
    pub tokens_per_second_p99: Option<f64>,

    pub output_tokens_per_second_mean: Option<f64>,
    pub output_tokens_per_second_p95: Option<f64>,
    pub output_tokens_per_second_p99: Option<f64>,

    pub time_per_output_token_mean_ms: Option<f64>,
    pub time_per_output_token_p95_ms: Option<f64>,
    pub time_per_output_token_p99_ms: Option<f64>,
}

/// One request of the run.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    pub timestamp: Option<String>,
    pub errored: bool,
    pub completed: bool,
    pub request_latency_seconds: Option<f64>,
    pub tokens_per_second: Option<f64>,
    pub output_tokens_per_second: Option<f64>,
    pub time_per_output_token_ms: Option<f64>,
    pub inter_token_latency_ms: Option<f64>,
    pub time_to_first_token_ms: Option<f64>,
    pub uuid: String,
    pub job_name: String,
}

/// An element of the output array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    /// The aggregate record, always first
    Summary(Box<SummaryRecord>),
    /// A per-request record
    Timeseries(TimeseriesRecord),
}

impl OutputRecord {
    /// The summary, if this is one.
    pub fn as_summary(&self) -> Option<&SummaryRecord> {
        match self {
            Self::Summary(summary) => Some(&**summary),
            Self::Timeseries(_) => None,
        }
    }

    /// The timeseries entry, if this is one.
    pub fn as_timeseries(&self) -> Option<&TimeseriesRecord> {
        match self {
            Self::Timeseries(entry) => Some(entry),
            Self::Summary(_) => None,
        }
    }
}

/// Format epoch seconds as RFC 3339 UTC with microsecond precision.
pub fn format_timestamp(epoch_secs: f64) -> Option<String> {
    if !epoch_secs.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_micros((epoch_secs * 1_000_000.0).round() as i64)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}
