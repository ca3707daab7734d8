// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metrics extraction.
//!
//! Every sample is reduced once to its [`RequestMetrics`]; those feed both
//! the per-request timeseries records and a single fold into
//! [`SampleFold`], which owns one accumulator per distribution. The
//! summary is assembled from the finished fold.
//!
//! Distributions are computed over successful requests only (completed and
//! not errored). Counts cover every sample.

use crate::document::{BenchmarkSection, RequestSample, RequestTotals};
use crate::record::{format_timestamp, OutputRecord, RunIdentity, SummaryRecord, TimeseriesRecord};
use crate::stats::{Distribution, MetricAccumulator, WindowCounts};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Width of the windows the throughput distribution is measured over.
pub const THROUGHPUT_WINDOW_SECS: f64 = 1.0;

/// Figures derived for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetrics {
    /// End-to-end latency in seconds
    pub latency_seconds: Option<f64>,
    /// Prompt plus output tokens per second of latency
    pub tokens_per_second: Option<f64>,
    /// Output tokens per second of latency
    pub output_tokens_per_second: Option<f64>,
    /// Milliseconds of latency per output token
    pub tpot_ms: Option<f64>,
    /// Time to first token in milliseconds
    pub ttft_ms: Option<f64>,
    /// Inter-token latency in milliseconds
    pub itl_ms: Option<f64>,
}

impl RequestMetrics {
    /// Derive the per-request figures of a sample.
    ///
    /// Rates are computed from token counts and latency when both are
    /// available, and fall back to the values the tool reported.
    pub fn derive(sample: &RequestSample) -> Self {
        let latency = sample.request_latency_seconds;
        let total_tokens = match (sample.prompt_tokens, sample.output_tokens) {
            (Some(prompt), Some(output)) => prompt.checked_add(output),
            _ => None,
        };

        let tpot_ms = match (latency, sample.output_tokens) {
            (Some(latency), Some(output)) if output > 0 => Some(latency * 1000.0 / output as f64),
            _ => None,
        };

        Self {
            latency_seconds: latency,
            tokens_per_second: per_second(total_tokens, latency)
                .or(sample.reported_tokens_per_second),
            output_tokens_per_second: per_second(sample.output_tokens, latency)
                .or(sample.reported_output_tokens_per_second),
            tpot_ms: tpot_ms.or(sample.reported_tpot_ms),
            ttft_ms: sample.ttft_ms,
            itl_ms: sample.itl_ms,
        }
    }
}

fn per_second(tokens: Option<u64>, latency_seconds: Option<f64>) -> Option<f64> {
    let latency = latency_seconds.filter(|l| *l > 0.0)?;
    tokens.map(|t| t as f64 / latency)
}

/// Accumulated state of one pass over the samples.
#[derive(Debug, Clone, Default)]
pub struct SampleFold {
    total: u64,
    successful: u64,
    errored: u64,
    earliest_start: Option<f64>,
    completions: Vec<f64>,
    ttft: MetricAccumulator,
    itl: MetricAccumulator,
    latency: MetricAccumulator,
    tokens_per_second: MetricAccumulator,
    output_tokens_per_second: MetricAccumulator,
    tpot: MetricAccumulator,
}

impl SampleFold {
    /// Fold one sample in.
    pub fn absorb(mut self, sample: &RequestSample, metrics: &RequestMetrics) -> Self {
        self.total += 1;
        if sample.errored {
            self.errored += 1;
        }
        if let Some(start) = sample.request_start {
            self.earliest_start = Some(self.earliest_start.map_or(start, |e| e.min(start)));
        }
        if !sample.is_successful() {
            return self;
        }

        self.successful += 1;
        if let (Some(start), Some(latency)) = (sample.request_start, metrics.latency_seconds) {
            self.completions.push(start + latency);
        }
        self.ttft.record(metrics.ttft_ms);
        self.itl.record(metrics.itl_ms);
        self.latency.record(metrics.latency_seconds);
        self.tokens_per_second.record(metrics.tokens_per_second);
        self.output_tokens_per_second.record(metrics.output_tokens_per_second);
        self.tpot.record(metrics.tpot_ms);
        self
    }

    /// Requests that were neither successful nor errored.
    pub fn incomplete(&self) -> u64 {
        self.total.saturating_sub(self.successful + self.errored)
    }

    fn throughput(&self) -> Distribution {
        match self.earliest_start {
            Some(origin) => {
                WindowCounts::collect(origin, &self.completions, THROUGHPUT_WINDOW_SECS).distribution()
            }
            None => Distribution::default(),
        }
    }

    /// Assemble the summary record.
    pub fn into_summary(self, section: &BenchmarkSection, identity: &RunIdentity) -> SummaryRecord {
        check_reported_totals(section, &self);

        let incomplete = self.incomplete();
        let throughput = self.throughput();
        let timestamp = section
            .start_time
            .or(self.earliest_start)
            .and_then(format_timestamp);
        let ttft = self.ttft.finish();
        let itl = self.itl.finish();
        let latency = self.latency.finish();
        let tokens_per_second = self.tokens_per_second.finish();
        let output_tokens_per_second = self.output_tokens_per_second.finish();
        let tpot = self.tpot.finish();

        SummaryRecord {
            uuid: identity.uuid.clone(),
            job_name: identity.job_name.clone(),
            timestamp,
            strategy: section.strategy.clone(),
            rate: section.rate,
            backend_model: section.backend_model.clone(),

            total_requests: self.total,
            successful_requests: self.successful,
            errored_requests: self.errored,
            incomplete_requests: incomplete,

            prompt_tokens: section.prompt_tokens,
            output_tokens: section.output_tokens,

            ttft_mean_ms: ttft.mean,
            ttft_p95_ms: ttft.p95,
            ttft_p99_ms: ttft.p99,

            itl_mean_ms: itl.mean,
            itl_p95_ms: itl.p95,
            itl_p99_ms: itl.p99,

            throughput_mean_rps: throughput.mean,
            throughput_p95_rps: throughput.p95,
            throughput_p99_rps: throughput.p99,

            request_latency_mean_seconds: latency.mean,
            request_latency_p95_seconds: latency.p95,
            request_latency_p99_seconds: latency.p99,

            tokens_per_second_mean: tokens_per_second.mean,
            tokens_per_second_p95: tokens_per_second.p95,
            tokens_per_second_p99: tokens_per_second.p99,

            output_tokens_per_second_mean: output_tokens_per_second.mean,
            output_tokens_per_second_p95: output_tokens_per_second.p95,
            output_tokens_per_second_p99: output_tokens_per_second.p99,

            time_per_output_token_mean_ms: tpot.mean,
            time_per_output_token_p95_ms: tpot.p95,
            time_per_output_token_p99_ms: tpot.p99,
        }
    }
}

/// Whether the tool's own request totals disagree with the counts taken
/// from the request lists. Totals the tool did not report are not compared.
pub fn totals_disagree(reported: &RequestTotals, fold: &SampleFold) -> bool {
    let differs = |reported: Option<u64>, derived: u64| reported.is_some_and(|r| r != derived);
    differs(reported.total, fold.total)
        || differs(reported.successful, fold.successful)
        || differs(reported.errored, fold.errored)
        || differs(reported.incomplete, fold.incomplete())
}

// The tool may publish only a sample of its requests, so reported totals
// can legitimately exceed the lists. Published counts always come from the
// samples.
fn check_reported_totals(section: &BenchmarkSection, fold: &SampleFold) {
    let Some(reported) = &section.reported_totals else {
        return;
    };
    if totals_disagree(reported, fold) {
        warn!(
            reported_total = ?reported.total,
            reported_successful = ?reported.successful,
            reported_errored = ?reported.errored,
            reported_incomplete = ?reported.incomplete,
            total = fold.total,
            successful = fold.successful,
            errored = fold.errored,
            "Reported request totals disagree with the request lists; using the lists"
        );
    }
}

/// Summary plus per-request records of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The aggregate record
    pub summary: SummaryRecord,
    /// One record per sample, in input order
    pub timeseries: Vec<TimeseriesRecord>,
}

impl Extraction {
    /// Concatenate into the output sequence, summary first.
    pub fn into_records(self) -> Vec<OutputRecord> {
        let mut records = Vec::with_capacity(self.timeseries.len() + 1);
        records.push(OutputRecord::Summary(Box::new(self.summary)));
        records.extend(self.timeseries.into_iter().map(OutputRecord::Timeseries));
        records
    }
}

/// Compute the summary and timeseries records of a benchmark.
pub fn extract(
    section: &BenchmarkSection,
    samples: &[RequestSample],
    identity: &RunIdentity,
) -> Extraction {
    let metrics: Vec<RequestMetrics> = samples.iter().map(RequestMetrics::derive).collect();

    let fold = samples
        .iter()
        .zip(&metrics)
        .fold(SampleFold::default(), |fold, (sample, m)| fold.absorb(sample, m));

    let timeseries = samples
        .iter()
        .zip(&metrics)
        .map(|(sample, m)| timeseries_record(sample, m, identity))
        .collect();

    let summary = fold.into_summary(section, identity);
    debug!(
        total = summary.total_requests,
        successful = summary.successful_requests,
        errored = summary.errored_requests,
        "Extracted benchmark metrics"
    );

    Extraction { summary, timeseries }
}

/// [`extract`] and concatenate into the output sequence.
pub fn build_records(
    section: &BenchmarkSection,
    samples: &[RequestSample],
    identity: &RunIdentity,
) -> Vec<OutputRecord> {
    extract(section, samples, identity).into_records()
}

fn timeseries_record(
    sample: &RequestSample,
    metrics: &RequestMetrics,
    identity: &RunIdentity,
) -> TimeseriesRecord {
    TimeseriesRecord {
        timestamp: sample.request_start.and_then(format_timestamp),
        errored: sample.errored,
        completed: sample.completed,
        request_latency_seconds: metrics.latency_seconds,
        tokens_per_second: metrics.tokens_per_second,
        output_tokens_per_second: metrics.output_tokens_per_second,
        time_per_output_token_ms: metrics.tpot_ms,
        inter_token_latency_ms: metrics.itl_ms,
        time_to_first_token_ms: metrics.ttft_ms,
        uuid: identity.uuid.clone(),
        job_name: identity.job_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(start: f64, latency: f64, output_tokens: u64) -> RequestSample {
        RequestSample {
            request_start: Some(start),
            completed: true,
            errored: false,
            request_latency_seconds: Some(latency),
            prompt_tokens: Some(256),
            output_tokens: Some(output_tokens),
            ttft_ms: None,
            itl_ms: None,
            reported_tokens_per_second: None,
            reported_output_tokens_per_second: None,
            reported_tpot_ms: None,
        }
    }

    fn errored(start: f64) -> RequestSample {
        RequestSample {
            request_start: Some(start),
            completed: false,
            errored: true,
            request_latency_seconds: None,
            prompt_tokens: None,
            output_tokens: None,
            ttft_ms: None,
            itl_ms: None,
            reported_tokens_per_second: None,
            reported_output_tokens_per_second: None,
            reported_tpot_ms: None,
        }
    }

    fn identity() -> RunIdentity {
        RunIdentity::new("run-1", "nightly")
    }

    #[test]
    fn test_derive_request_metrics() {
        let metrics = RequestMetrics::derive(&completed(0.0, 2.0, 128));
        assert_eq!(metrics.latency_seconds, Some(2.0));
        assert_eq!(metrics.tokens_per_second, Some(192.0));
        assert_eq!(metrics.output_tokens_per_second, Some(64.0));
        assert_eq!(metrics.tpot_ms, Some(2000.0 / 128.0));
    }

    #[test]
    fn test_derive_guards_zero_latency_and_tokens() {
        let mut sample = completed(0.0, 0.0, 0);
        let metrics = RequestMetrics::derive(&sample);
        assert_eq!(metrics.tokens_per_second, None);
        assert_eq!(metrics.output_tokens_per_second, None);
        assert_eq!(metrics.tpot_ms, None);

        sample.reported_tokens_per_second = Some(50.0);
        sample.reported_tpot_ms = Some(9.5);
        let metrics = RequestMetrics::derive(&sample);
        assert_eq!(metrics.tokens_per_second, Some(50.0));
        assert_eq!(metrics.tpot_ms, Some(9.5));
    }

    #[test]
    fn test_mixed_run() {
        let samples = vec![completed(100.0, 2.0, 128), completed(100.5, 2.2, 128), errored(101.0)];
        let extraction = extract(&BenchmarkSection::default(), &samples, &identity());
        let summary = &extraction.summary;

        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_requests, 2);
        assert_eq!(summary.errored_requests, 1);
        assert_eq!(summary.incomplete_requests, 0);
        assert!((summary.request_latency_mean_seconds.unwrap() - 2.1).abs() < 1e-9);
        assert_eq!(summary.request_latency_p99_seconds, Some(2.2));
        assert_eq!(summary.ttft_mean_ms, None);

        assert_eq!(extraction.timeseries.len(), 3);
        let failed = &extraction.timeseries[2];
        assert!(!failed.completed);
        assert!(failed.errored);
        assert_eq!(failed.request_latency_seconds, None);
        assert_eq!(failed.tokens_per_second, None);
        assert_eq!(failed.uuid, "run-1");
        assert_eq!(failed.job_name, "nightly");
    }

    #[test]
    fn test_empty_run() {
        let records = build_records(&BenchmarkSection::default(), &[], &RunIdentity::default());
        assert_eq!(records.len(), 1);

        let summary = records[0].as_summary().unwrap();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.incomplete_requests, 0);
        assert_eq!(summary.uuid, "");
        assert_eq!(summary.timestamp, None);
        assert_eq!(summary.ttft_mean_ms, None);
        assert_eq!(summary.throughput_mean_rps, None);
        assert_eq!(summary.request_latency_p95_seconds, None);
        assert_eq!(summary.time_per_output_token_p99_ms, None);
    }

    #[test]
    fn test_ttft_in_seconds_reported_in_ms() {
        let mut sample = completed(0.0, 3.0, 10);
        sample.ttft_ms = Some(crate::document::TimeUnit::Seconds.to_millis(1.0142));
        let summary = extract(&BenchmarkSection::default(), &[sample], &identity()).summary;
        assert!((summary.ttft_mean_ms.unwrap() - 1014.2).abs() < 1e-9);
        assert_eq!(summary.ttft_p99_ms, summary.ttft_mean_ms);
    }

    #[test]
    fn test_incomplete_requests_counted() {
        let mut pending = errored(0.0);
        pending.errored = false;
        let samples = vec![completed(0.0, 1.0, 8), pending];
        let summary = extract(&BenchmarkSection::default(), &samples, &identity()).summary;
        assert_eq!(summary.incomplete_requests, 1);
        assert_eq!(summary.request_latency_mean_seconds, Some(1.0));
    }

    #[test]
    fn test_errored_but_completed_excluded_from_distributions() {
        let mut sample = completed(0.0, 9.0, 8);
        sample.errored = true;
        let summary = extract(&BenchmarkSection::default(), &[sample], &identity()).summary;
        assert_eq!(summary.errored_requests, 1);
        assert_eq!(summary.successful_requests, 0);
        assert_eq!(summary.request_latency_mean_seconds, None);
    }

    #[test]
    fn test_throughput_windows() {
        // completions at 1.5, 1.8 and 3.2 seconds after the first start
        let samples = vec![
            completed(10.0, 1.5, 8),
            completed(10.3, 1.5, 8),
            completed(11.0, 2.2, 8),
        ];
        let summary = extract(&BenchmarkSection::default(), &samples, &identity()).summary;
        assert_eq!(summary.throughput_mean_rps, Some(0.75));
        assert_eq!(summary.throughput_p99_rps, Some(2.0));
    }

    #[test]
    fn test_summary_metadata_from_section() {
        let section = BenchmarkSection {
            start_time: Some(0.0),
            strategy: Some("poisson".to_string()),
            rate: Some(2.5),
            backend_model: Some("model-x".to_string()),
            prompt_tokens: Some(256),
            output_tokens: Some(128),
            reported_totals: None,
        };
        let summary = extract(&section, &[completed(5.0, 1.0, 8)], &identity()).summary;
        assert_eq!(summary.timestamp.as_deref(), Some("1970-01-01T00:00:00.000000Z"));
        assert_eq!(summary.strategy.as_deref(), Some("poisson"));
        assert_eq!(summary.rate, Some(2.5));
        assert_eq!(summary.backend_model.as_deref(), Some("model-x"));
        assert_eq!(summary.prompt_tokens, Some(256));
    }

    #[test]
    fn test_timestamp_falls_back_to_earliest_sample() {
        let samples = vec![completed(7.0, 1.0, 8), errored(3.0)];
        let summary = extract(&BenchmarkSection::default(), &samples, &identity()).summary;
        assert_eq!(summary.timestamp.as_deref(), Some("1970-01-01T00:00:03.000000Z"));
    }

    fn fold(samples: &[RequestSample]) -> SampleFold {
        samples.iter().fold(SampleFold::default(), |fold, sample| {
            fold.absorb(sample, &RequestMetrics::derive(sample))
        })
    }

    #[test]
    fn test_token_sum_overflow_is_undefined() {
        let mut sample = completed(0.0, 1.0, 128);
        sample.prompt_tokens = Some(u64::MAX);
        let metrics = RequestMetrics::derive(&sample);
        assert_eq!(metrics.tokens_per_second, None);
        assert_eq!(metrics.output_tokens_per_second, Some(128.0));

        sample.reported_tokens_per_second = Some(300.0);
        assert_eq!(RequestMetrics::derive(&sample).tokens_per_second, Some(300.0));
    }

    #[test]
    fn test_reported_totals_disagreement() {
        let samples = vec![completed(0.0, 1.0, 8), completed(0.5, 1.0, 8), errored(1.0)];
        let fold = fold(&samples);

        let matching = RequestTotals {
            total: Some(3),
            successful: Some(2),
            errored: Some(1),
            incomplete: Some(0),
        };
        assert!(!totals_disagree(&matching, &fold));
        assert!(!totals_disagree(&RequestTotals::default(), &fold));

        let sampled = RequestTotals {
            total: Some(100),
            ..RequestTotals::default()
        };
        assert!(totals_disagree(&sampled, &fold));

        let section = BenchmarkSection {
            reported_totals: Some(sampled),
            ..BenchmarkSection::default()
        };
        let summary = extract(&section, &samples, &identity()).summary;
        assert_eq!(summary.total_requests, 3);
        assert_eq!(
            summary.successful_requests + summary.errored_requests + summary.incomplete_requests,
            summary.total_requests
        );
    }

    #[test]
    fn test_throughput_over_long_idle_span() {
        let samples = vec![completed(0.0, 1.0, 8), completed(1_750_000_000.0, 1.0, 8)];
        let summary = extract(&BenchmarkSection::default(), &samples, &identity()).summary;
        assert_eq!(summary.successful_requests, 2);
        assert_eq!(summary.throughput_p99_rps, Some(0.0));
        assert!(summary.throughput_mean_rps.unwrap() > 0.0);

        let slow = completed(0.0, 1.0e19, 8);
        let summary = extract(&BenchmarkSection::default(), &[slow], &identity()).summary;
        assert_eq!(summary.throughput_p99_rps, Some(0.0));
    }

    mod properties {
        use super::*;
        use crate::document::SampleBucket;
        use proptest::prelude::*;
        use serde_json::json;

        fn sample(kind: u8, latency: Option<f64>) -> RequestSample {
            let bucket = match kind % 4 {
                0 => SampleBucket::Successful,
                1 => SampleBucket::Errored,
                2 => SampleBucket::Incomplete,
                _ => SampleBucket::Unsorted,
            };
            RequestSample::from_value(
                &json!({"scheduler_info": {"request_start": 100.0}, "request_latency": latency}),
                bucket,
            )
        }

        proptest! {
            #[test]
            fn prop_counts_partition_total(
                kinds in proptest::collection::vec((any::<u8>(), proptest::option::of(0.01f64..30.0)), 0..64)
            ) {
                let samples: Vec<RequestSample> =
                    kinds.iter().map(|(kind, latency)| sample(*kind, *latency)).collect();
                let records = build_records(&BenchmarkSection::default(), &samples, &identity());
                prop_assert_eq!(records.len(), samples.len() + 1);

                let summary = records[0].as_summary().unwrap();
                prop_assert_eq!(summary.total_requests, samples.len() as u64);
                prop_assert_eq!(
                    summary.successful_requests + summary.errored_requests + summary.incomplete_requests,
                    summary.total_requests
                );
            }
        }
    }
}
