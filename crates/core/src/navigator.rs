// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Locating benchmark data inside a raw result document.
//!
//! The benchmarking tool has moved its per-run data around between
//! releases. Each known location is one entry in [`SECTION_STRATEGIES`];
//! they are tried in order and the first that resolves to a non-empty
//! object wins. Supporting a new layout means adding a line to that table.

use crate::document::{BenchmarkSection, RequestSample, SampleBucket};
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// One way of finding the benchmark section in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Follow a JSON pointer from the document root.
    Pointer(&'static str),
    /// Treat the root itself as the section when it looks like one.
    BareSection,
}

/// Known section locations, most specific first.
///
/// The legacy nested layout must precede `/benchmarks/0`, which also
/// resolves (to the outer wrapper) in those documents.
pub const SECTION_STRATEGIES: &[LookupStrategy] = &[
    LookupStrategy::Pointer("/benchmarks/0/benchmarks/0"),
    LookupStrategy::Pointer("/benchmarks/0"),
    LookupStrategy::Pointer("/report/benchmarks/0"),
    LookupStrategy::BareSection,
];

const REQUEST_BUCKETS: &[(&str, SampleBucket)] = &[
    ("successful", SampleBucket::Successful),
    ("errored", SampleBucket::Errored),
    ("incomplete", SampleBucket::Incomplete),
];

const LEGACY_BUCKETS: &[(&str, SampleBucket)] = &[
    ("results", SampleBucket::Successful),
    ("errors", SampleBucket::Errored),
];

impl LookupStrategy {
    /// Human-readable location, used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pointer(pointer) => pointer,
            Self::BareSection => "<root>",
        }
    }

    /// Resolve this strategy against a document.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let candidate = match self {
            Self::Pointer(pointer) => document.pointer(pointer),
            Self::BareSection => Some(document)
                .filter(|doc| doc.get("requests").is_some() || doc.get("request_totals").is_some()),
        };
        candidate.filter(|value| value.as_object().is_some_and(|object| !object.is_empty()))
    }
}

/// Borrowed benchmark data found in a document, before typing.
#[derive(Debug, Clone)]
pub struct LocatedBenchmark<'a> {
    /// Location the section was found at
    pub location: &'static str,
    /// The benchmark section sub-tree
    pub section: &'a Value,
    /// Per-request entries in output order, tagged with their source list
    pub samples: Vec<(SampleBucket, &'a Value)>,
}

/// Find the benchmark section and its request list.
pub fn locate(document: &Value) -> Result<LocatedBenchmark<'_>> {
    for strategy in SECTION_STRATEGIES {
        if let Some(section) = strategy.resolve(document) {
            let samples = collect_samples(section);
            debug!(
                location = strategy.label(),
                samples = samples.len(),
                "Located benchmark section"
            );
            return Ok(LocatedBenchmark {
                location: strategy.label(),
                section,
                samples,
            });
        }
        debug!(location = strategy.label(), "No benchmark section");
    }

    Err(Error::SectionNotFound {
        tried: SECTION_STRATEGIES
            .iter()
            .map(|strategy| strategy.label().to_string())
            .collect(),
    })
}

/// Locate the benchmark and read it into typed form.
pub fn navigate(document: &Value) -> Result<(BenchmarkSection, Vec<RequestSample>)> {
    let located = locate(document)?;
    let section = BenchmarkSection::from_value(located.section);
    let samples = located
        .samples
        .iter()
        .map(|(bucket, value)| RequestSample::from_value(value, *bucket))
        .collect();
    Ok((section, samples))
}

fn collect_samples(section: &Value) -> Vec<(SampleBucket, &Value)> {
    match section.get("requests") {
        Some(Value::Object(_)) => gather(section.get("requests"), REQUEST_BUCKETS),
        Some(Value::Array(items)) => items.iter().map(|item| (SampleBucket::Unsorted, item)).collect(),
        _ => gather(Some(section), LEGACY_BUCKETS),
    }
}

fn gather<'a>(
    parent: Option<&'a Value>,
    buckets: &[(&str, SampleBucket)],
) -> Vec<(SampleBucket, &'a Value)> {
    let Some(parent) = parent else {
        return Vec::new();
    };
    buckets
        .iter()
        .filter_map(|(key, bucket)| parent.get(*key).and_then(Value::as_array).map(|items| (*bucket, items)))
        .flat_map(|(bucket, items)| items.iter().map(move |item| (bucket, item)))
        .collect()
}
