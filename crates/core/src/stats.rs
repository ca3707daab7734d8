// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Distribution statistics over per-request values.
//!
//! Percentiles use the nearest-rank rule: for `n` ascending values the
//! p-th percentile is the value at index `ceil(p * n) - 1`, clamped to
//! `[0, n - 1]`. No interpolation, so every reported percentile is an
//! observed value. Empty inputs produce `None` everywhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics of one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Number of values the statistics were computed over
    pub count: usize,
    /// Arithmetic mean
    pub mean: Option<f64>,
    /// 50th percentile (median)
    pub p50: Option<f64>,
    /// 95th percentile
    pub p95: Option<f64>,
    /// 99th percentile
    pub p99: Option<f64>,
}

impl Distribution {
    /// Compute statistics from unsorted values. Non-finite values are ignored.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            count: sorted.len(),
            mean: mean(sorted),
            p50: percentile(sorted, 0.50),
            p95: percentile(sorted, 0.95),
            p99: percentile(sorted, 0.99),
        }
    }

    /// Whether no values were observed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Nearest-rank percentile over ascending values, `None` for an empty slice.
pub fn percentile(sorted: &[f64], quantile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let rank = (quantile.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    sorted.get(rank.saturating_sub(1).min(n - 1)).copied()
}

/// Collects the defined values of one metric.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    values: Vec<f64>,
}

impl MetricAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value if it is defined and finite.
    pub fn record(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.values.push(v);
        }
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the accumulator into a distribution.
    pub fn finish(self) -> Distribution {
        let mut sorted = self.values;
        sorted.sort_by(f64::total_cmp);
        Distribution::from_sorted(&sorted)
    }
}

/// Per-window event counts, used as a requests-per-second distribution.
///
/// Events are instants in seconds. The windows start at `origin` and are
/// `window_secs` wide; the last window is the one containing the latest
/// event. Only occupied windows are stored: the empty ones all count as
/// zero and are known from the window total, so a wide span of idle time
/// costs nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowCounts {
    windows: u64,
    occupied: BTreeMap<u64, u64>,
}

impl WindowCounts {
    /// Bucket `events` into windows. Non-finite events are ignored; there
    /// are no windows when nothing remains or the width is not positive.
    pub fn collect(origin: f64, events: &[f64], window_secs: f64) -> Self {
        let events: Vec<f64> = events.iter().copied().filter(|t| t.is_finite()).collect();
        if events.is_empty() || window_secs.is_nan() || window_secs <= 0.0 || !origin.is_finite() {
            return Self::default();
        }

        let last = events.iter().copied().fold(origin, f64::max);
        // float to int casts saturate
        let windows = (((last - origin) / window_secs).ceil() as u64).max(1);
        let mut occupied = BTreeMap::new();
        for t in events {
            let index = (((t - origin) / window_secs).floor().max(0.0) as u64).min(windows - 1);
            *occupied.entry(index).or_insert(0) += 1;
        }
        Self { windows, occupied }
    }

    /// Number of windows, empty ones included.
    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Number of windows holding no event.
    pub fn empty_windows(&self) -> u64 {
        self.windows - self.occupied.len() as u64
    }

    /// Total events counted.
    pub fn events(&self) -> u64 {
        self.occupied.values().sum()
    }

    /// Event count of the window at `index`.
    pub fn count_at(&self, index: u64) -> u64 {
        self.occupied.get(&index).copied().unwrap_or(0)
    }

    /// Statistics over the per-window counts, empty windows included.
    pub fn distribution(&self) -> Distribution {
        if self.windows == 0 {
            return Distribution::default();
        }
        let mut busy: Vec<f64> = self.occupied.values().map(|&c| c as f64).collect();
        busy.sort_by(f64::total_cmp);

        Distribution {
            count: usize::try_from(self.windows).unwrap_or(usize::MAX),
            mean: Some(self.events() as f64 / self.windows as f64),
            p50: Some(self.percentile(&busy, 0.50)),
            p95: Some(self.percentile(&busy, 0.95)),
            p99: Some(self.percentile(&busy, 0.99)),
        }
    }

    // Nearest rank over the virtual ascending sequence: the zero counts of
    // the empty windows, then the sorted busy counts.
    fn percentile(&self, busy: &[f64], quantile: f64) -> f64 {
        let n = self.windows;
        let rank = (quantile.clamp(0.0, 1.0) * n as f64).ceil() as u64;
        let index = rank.saturating_sub(1).min(n - 1);
        let empty = self.empty_windows();
        if index < empty {
            return 0.0;
        }
        usize::try_from(index - empty)
            .ok()
            .and_then(|i| busy.get(i))
            .copied()
            .unwrap_or(0.0)
    }
}
