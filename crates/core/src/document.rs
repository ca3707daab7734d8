// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed view over a raw benchmark document.
//!
//! The benchmarking tool's output drifts between versions, so every field
//! here is optional and is looked up through a short ordered list of JSON
//! pointers. Leaf values are coerced leniently: numbers may arrive as
//! numbers or numeric strings, flags as booleans, strings or 0/1.
//!
//! Time-valued fields carry their unit in the key they were read from
//! (`time_to_first_token_ms` vs `time_to_first_token`), and are normalized
//! here so the extractor only ever sees milliseconds for TTFT/ITL/TPOT and
//! seconds for request latency.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unit a time value was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Seconds
    Seconds,
    /// Milliseconds
    Milliseconds,
}

impl TimeUnit {
    /// Convert a value in this unit to milliseconds.
    pub fn to_millis(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value * 1000.0,
            Self::Milliseconds => value,
        }
    }

    /// Convert a value in this unit to seconds.
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            Self::Seconds => value,
            Self::Milliseconds => value / 1000.0,
        }
    }
}

/// A JSON pointer paired with the unit the value under it is recorded in.
type TimedField = (&'static str, TimeUnit);

const SECTION_START_FIELDS: &[&str] = &["/start_time", "/run_stats/start_time"];
const STRATEGY_FIELDS: &[&str] = &["/args/strategy/type_", "/args/strategy/type", "/mode"];
const RATE_FIELDS: &[&str] = &["/args/strategy/rate", "/rate"];
const MODEL_FIELDS: &[&str] = &["/worker/backend_model", "/args/model", "/model"];
const LOADER_DATA_FIELDS: &[&str] = &["/request_loader/data", "/args/data"];

const SAMPLE_START_FIELDS: &[&str] = &[
    "/scheduler_info/request_start",
    "/scheduler_info/request_timings/request_start",
    "/request_start",
    "/start_time",
];
const COMPLETED_FIELDS: &[&str] = &["/scheduler_info/completed", "/completed"];
const ERRORED_FIELDS: &[&str] = &["/scheduler_info/errored", "/errored"];
const PROMPT_TOKEN_FIELDS: &[&str] = &["/prompt_tokens", "/prompt_token_count", "/input_tokens"];
const OUTPUT_TOKEN_FIELDS: &[&str] = &["/output_tokens", "/output_token_count"];
const LATENCY_FIELDS: &[TimedField] = &[
    ("/request_latency", TimeUnit::Seconds),
    ("/request_latency_seconds", TimeUnit::Seconds),
    ("/request_latency_ms", TimeUnit::Milliseconds),
    ("/latency", TimeUnit::Seconds),
];
const TTFT_FIELDS: &[TimedField] = &[
    ("/time_to_first_token_ms", TimeUnit::Milliseconds),
    ("/time_to_first_token", TimeUnit::Seconds),
    ("/ttft", TimeUnit::Seconds),
];
const ITL_FIELDS: &[TimedField] = &[
    ("/inter_token_latency_ms", TimeUnit::Milliseconds),
    ("/inter_token_latency", TimeUnit::Seconds),
    ("/itl", TimeUnit::Seconds),
];
const TPOT_FIELDS: &[TimedField] = &[
    ("/time_per_output_token_ms", TimeUnit::Milliseconds),
    ("/time_per_output_token", TimeUnit::Seconds),
];
const TOKENS_PER_SECOND_FIELDS: &[&str] = &["/tokens_per_second"];
const OUTPUT_TOKENS_PER_SECOND_FIELDS: &[&str] = &["/output_tokens_per_second"];

/// Request counts as reported by the benchmarking tool itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestTotals {
    /// Total requests issued
    pub total: Option<u64>,
    /// Requests that completed without error
    pub successful: Option<u64>,
    /// Requests that errored
    pub errored: Option<u64>,
    /// Requests cut off before completion
    pub incomplete: Option<u64>,
}

impl RequestTotals {
    fn from_value(value: &Value) -> Option<Self> {
        let node = value.pointer("/request_totals")?;
        let totals = Self {
            total: node.get("total").and_then(count),
            successful: node.get("successful").and_then(count),
            errored: node.get("errored").and_then(count),
            incomplete: node.get("incomplete").and_then(count),
        };
        (totals != Self::default()).then_some(totals)
    }
}

/// Run-level metadata of one benchmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSection {
    /// Benchmark start, seconds since the Unix epoch
    pub start_time: Option<f64>,
    /// Scheduling strategy (`synchronous`, `constant`, `poisson`, ...)
    pub strategy: Option<String>,
    /// Configured request rate of the strategy
    pub rate: Option<f64>,
    /// Model served by the backend under test
    pub backend_model: Option<String>,
    /// Prompt tokens per request requested from the data loader
    pub prompt_tokens: Option<u64>,
    /// Output tokens per request requested from the data loader
    pub output_tokens: Option<u64>,
    /// Totals the tool reported alongside the per-request lists
    pub reported_totals: Option<RequestTotals>,
}

impl BenchmarkSection {
    /// Read the typed section out of a located benchmark sub-tree.
    pub fn from_value(value: &Value) -> Self {
        let (prompt_tokens, output_tokens) = LOADER_DATA_FIELDS
            .iter()
            .find_map(|pointer| value.pointer(pointer).filter(|v| !v.is_null()))
            .map(loader_token_counts)
            .unwrap_or_default();

        Self {
            start_time: first_number(value, SECTION_START_FIELDS),
            strategy: first_string(value, STRATEGY_FIELDS),
            rate: first_number(value, RATE_FIELDS),
            backend_model: first_string(value, MODEL_FIELDS),
            prompt_tokens,
            output_tokens,
            reported_totals: RequestTotals::from_value(value),
        }
    }
}

/// Which per-request list a sample was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleBucket {
    /// `requests.successful` / legacy `results`
    Successful,
    /// `requests.errored` / legacy `errors`
    Errored,
    /// `requests.incomplete`
    Incomplete,
    /// A flat list with no bucket information
    Unsorted,
}

/// One request attempt, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSample {
    /// Request start, seconds since the Unix epoch
    pub request_start: Option<f64>,
    /// The request ran to completion
    pub completed: bool,
    /// The request failed
    pub errored: bool,
    /// End-to-end latency in seconds
    pub request_latency_seconds: Option<f64>,
    /// Prompt token count
    pub prompt_tokens: Option<u64>,
    /// Generated token count
    pub output_tokens: Option<u64>,
    /// Time to first token in milliseconds
    pub ttft_ms: Option<f64>,
    /// Inter-token latency in milliseconds
    pub itl_ms: Option<f64>,
    /// Tokens per second as reported by the tool
    pub reported_tokens_per_second: Option<f64>,
    /// Output tokens per second as reported by the tool
    pub reported_output_tokens_per_second: Option<f64>,
    /// Time per output token in milliseconds as reported by the tool
    pub reported_tpot_ms: Option<f64>,
}

impl RequestSample {
    /// Read a sample, falling back to the bucket for missing status flags.
    pub fn from_value(value: &Value, bucket: SampleBucket) -> Self {
        let request_latency_seconds =
            first_timed(value, LATENCY_FIELDS).map(|(v, unit)| unit.to_seconds(v));
        let (default_completed, default_errored) = match bucket {
            SampleBucket::Successful => (true, false),
            SampleBucket::Errored => (false, true),
            SampleBucket::Incomplete => (false, false),
            SampleBucket::Unsorted => {
                let errored = has_error_message(value);
                (!errored && request_latency_seconds.is_some(), errored)
            }
        };

        Self {
            request_start: first_number(value, SAMPLE_START_FIELDS),
            completed: first_flag(value, COMPLETED_FIELDS).unwrap_or(default_completed),
            errored: first_flag(value, ERRORED_FIELDS).unwrap_or(default_errored),
            request_latency_seconds,
            prompt_tokens: first_count(value, PROMPT_TOKEN_FIELDS),
            output_tokens: first_count(value, OUTPUT_TOKEN_FIELDS),
            ttft_ms: first_timed(value, TTFT_FIELDS).map(|(v, unit)| unit.to_millis(v)),
            itl_ms: first_timed(value, ITL_FIELDS).map(|(v, unit)| unit.to_millis(v)),
            reported_tokens_per_second: first_number(value, TOKENS_PER_SECOND_FIELDS),
            reported_output_tokens_per_second: first_number(value, OUTPUT_TOKENS_PER_SECOND_FIELDS),
            reported_tpot_ms: first_timed(value, TPOT_FIELDS).map(|(v, unit)| unit.to_millis(v)),
        }
    }

    /// Completed without error.
    pub fn is_successful(&self) -> bool {
        self.completed && !self.errored
    }
}

/// Parse the data loader's `prompt_tokens=256,output_tokens=128` string.
///
/// The loader configuration may also arrive as an object, or as a string
/// holding a JSON object.
pub fn loader_token_counts(data: &Value) -> (Option<u64>, Option<u64>) {
    match data {
        Value::Object(_) => (
            data.get("prompt_tokens").and_then(count),
            data.get("output_tokens").and_then(count),
        ),
        Value::String(s) => {
            if let Ok(object @ Value::Object(_)) = serde_json::from_str::<Value>(s) {
                return loader_token_counts(&object);
            }
            let mut prompt = None;
            let mut output = None;
            for pair in s.split(',') {
                let Some((key, raw)) = pair.split_once('=') else {
                    continue;
                };
                let parsed = raw.trim().parse::<u64>().ok();
                match key.trim() {
                    "prompt_tokens" => prompt = parsed,
                    "output_tokens" => output = parsed,
                    _ => {}
                }
            }
            (prompt, output)
        }
        _ => (None, None),
    }
}

/// Coerce a leaf into a finite number.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) if n.is_u64() => n.as_u64(),
        _ => number(value).filter(|v| *v >= 0.0).map(|v| v.round() as u64),
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

fn first_number(node: &Value, pointers: &[&str]) -> Option<f64> {
    pointers.iter().find_map(|p| node.pointer(p).and_then(number))
}

fn first_count(node: &Value, pointers: &[&str]) -> Option<u64> {
    pointers.iter().find_map(|p| node.pointer(p).and_then(count))
}

fn first_flag(node: &Value, pointers: &[&str]) -> Option<bool> {
    pointers.iter().find_map(|p| node.pointer(p).and_then(flag))
}

fn first_string(node: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| {
        node.pointer(p)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn first_timed(node: &Value, fields: &[TimedField]) -> Option<(f64, TimeUnit)> {
    fields
        .iter()
        .find_map(|(p, unit)| node.pointer(p).and_then(number).map(|v| (v, *unit)))
}

fn has_error_message(node: &Value) -> bool {
    match node.get("error") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
