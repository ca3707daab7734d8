//! Markdown output generation for benchmark summaries.
//!
//! This module renders a summary record as a human-readable report, an
//! alternative to the JSON array for quick inspection in CI logs.

use guidellm_report_core::SummaryRecord;
use std::fmt::Write;

fn metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn tokens(value: Option<u64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn text(value: Option<&str>) -> &str {
    value.filter(|s| !s.is_empty()).unwrap_or("n/a")
}

/// Generate a markdown report from a summary record.
///
/// `timeseries_len` is the number of per-request records that accompany
/// the summary.
pub fn render_summary(summary: &SummaryRecord, timeseries_len: usize) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut output, summary, timeseries_len);
    output
}

fn write_summary(
    output: &mut String,
    summary: &SummaryRecord,
    timeseries_len: usize,
) -> std::fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;
    writeln!(output, "| Field | Value |")?;
    writeln!(output, "|-------|-------|")?;
    writeln!(output, "| UUID | {} |", text(Some(summary.uuid.as_str())))?;
    writeln!(output, "| Job | {} |", text(Some(summary.job_name.as_str())))?;
    writeln!(output, "| Started | {} |", text(summary.timestamp.as_deref()))?;
    writeln!(output, "| Model | {} |", text(summary.backend_model.as_deref()))?;
    writeln!(output, "| Strategy | {} |", text(summary.strategy.as_deref()))?;
    writeln!(output, "| Rate | {} |", metric(summary.rate))?;
    writeln!(output, "| Prompt tokens | {} |", tokens(summary.prompt_tokens))?;
    writeln!(output, "| Output tokens | {} |", tokens(summary.output_tokens))?;
    writeln!(output)?;

    writeln!(output, "## Requests")?;
    writeln!(output)?;
    writeln!(output, "| Total | Successful | Errored | Incomplete |")?;
    writeln!(output, "|-------|------------|---------|------------|")?;
    writeln!(
        output,
        "| {} | {} | {} | {} |",
        summary.total_requests,
        summary.successful_requests,
        summary.errored_requests,
        summary.incomplete_requests
    )?;
    writeln!(output)?;

    writeln!(output, "## Metrics")?;
    writeln!(output)?;
    writeln!(output, "| Metric | Mean | p95 | p99 |")?;
    writeln!(output, "|--------|------|-----|-----|")?;
    let rows = [
        ("TTFT (ms)", summary.ttft_mean_ms, summary.ttft_p95_ms, summary.ttft_p99_ms),
        ("ITL (ms)", summary.itl_mean_ms, summary.itl_p95_ms, summary.itl_p99_ms),
        (
            "TPOT (ms)",
            summary.time_per_output_token_mean_ms,
            summary.time_per_output_token_p95_ms,
            summary.time_per_output_token_p99_ms,
        ),
        (
            "Request latency (s)",
            summary.request_latency_mean_seconds,
            summary.request_latency_p95_seconds,
            summary.request_latency_p99_seconds,
        ),
        (
            "Throughput (req/s)",
            summary.throughput_mean_rps,
            summary.throughput_p95_rps,
            summary.throughput_p99_rps,
        ),
        (
            "Tokens/s",
            summary.tokens_per_second_mean,
            summary.tokens_per_second_p95,
            summary.tokens_per_second_p99,
        ),
        (
            "Output tokens/s",
            summary.output_tokens_per_second_mean,
            summary.output_tokens_per_second_p95,
            summary.output_tokens_per_second_p99,
        ),
    ];
    for (name, mean, p95, p99) in rows {
        writeln!(
            output,
            "| {} | {} | {} | {} |",
            name,
            metric(mean),
            metric(p95),
            metric(p99)
        )?;
    }

    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(output, "Timeseries records: {}", timeseries_len)?;
    Ok(())
}
