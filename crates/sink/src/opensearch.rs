// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! OpenSearch sink.
//!
//! Records are pushed document-by-document through a single `_bulk`
//! request, preceded by a ping of the cluster root. There are no retries:
//! a failure is reported to the caller and the run's output stands.
//!
//! # Example
//!
//! ```ignore
//! use guidellm_report_sink::{OpenSearchSink, RecordSink};
//!
//! let sink = OpenSearchSink::new("http://localhost:9200", "guidellm-results")?;
//! let report = sink.index(&records).await?;
//! println!("Indexed {} documents", report.indexed);
//! ```

use crate::{IndexReport, RecordSink, Result, SinkError};
use async_trait::async_trait;
use guidellm_report_core::OutputRecord;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for each HTTP call to the cluster.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const NDJSON: &str = "application/x-ndjson";

/// Sink that bulk-indexes records into an OpenSearch index.
#[derive(Debug, Clone)]
pub struct OpenSearchSink {
    client: Client,
    endpoint: Url,
    index: String,
}

impl OpenSearchSink {
    /// Create a sink for `server` (e.g. `http://localhost:9200`) and `index`.
    pub fn new(server: &str, index: impl Into<String>) -> Result<Self> {
        Self::with_timeout(server, index, DEFAULT_TIMEOUT)
    }

    /// Create a sink with a custom per-request timeout.
    pub fn with_timeout(server: &str, index: impl Into<String>, timeout: Duration) -> Result<Self> {
        let index = index.into();
        if index.trim().is_empty() {
            return Err(SinkError::InvalidConfig("index name is empty".to_string()));
        }

        let endpoint = parse_endpoint(server)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            index,
        })
    }

    /// Cluster endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Target index.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// URL of the bulk API.
    pub fn bulk_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!("{}/_bulk", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;
        if !response.status().is_success() {
            return Err(SinkError::Unavailable {
                endpoint: self.endpoint.to_string(),
                reason: format!("ping returned {}", response.status()),
            });
        }
        Ok(())
    }

    fn unavailable(&self, err: reqwest::Error) -> SinkError {
        SinkError::Unavailable {
            endpoint: self.endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl RecordSink for OpenSearchSink {
    async fn index(&self, records: &[OutputRecord]) -> Result<IndexReport> {
        if records.is_empty() {
            return Ok(IndexReport::default());
        }

        self.ping().await?;
        let body = bulk_body(&self.index, records)?;
        debug!(
            url = %self.bulk_url(),
            documents = records.len(),
            bytes = body.len(),
            "Sending bulk request"
        );

        let response = self
            .client
            .post(self.bulk_url())
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.unavailable(e))?;
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: Value = serde_json::from_str(&text)?;
        let report = summarize_bulk_response(&parsed, records.len());
        if report.failed > 0 {
            warn!(
                index = %self.index,
                failed = report.failed,
                total = records.len(),
                "Bulk request partially rejected"
            );
            return Err(SinkError::Partial {
                failed: report.failed,
                total: records.len(),
            });
        }

        info!(index = %self.index, indexed = report.indexed, "Indexed records");
        Ok(report)
    }
}

fn parse_endpoint(server: &str) -> Result<Url> {
    let url = Url::parse(server.trim())
        .map_err(|e| SinkError::InvalidConfig(format!("invalid server URL '{server}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SinkError::InvalidConfig(format!(
            "unsupported URL scheme '{other}'"
        ))),
    }
}

/// Build the NDJSON body of a bulk request: one `index` action per record.
pub fn bulk_body(index: &str, records: &[OutputRecord]) -> Result<String> {
    let action = json!({"index": {"_index": index}}).to_string();
    let mut body = String::new();
    for record in records {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

/// Count accepted and rejected items in a bulk response.
///
/// Items missing from the response are counted as rejected.
pub fn summarize_bulk_response(response: &Value, total: usize) -> IndexReport {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let indexed = items
        .iter()
        .filter_map(|item| item.as_object().and_then(|o| o.values().next()))
        .filter(|result| {
            let status_ok = result
                .get("status")
                .and_then(Value::as_u64)
                .is_some_and(|s| (200..300).contains(&s));
            status_ok && result.get("error").is_none()
        })
        .count();

    IndexReport {
        indexed,
        failed: total.saturating_sub(indexed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidellm_report_core::{process, RunIdentity};

    fn records() -> Vec<OutputRecord> {
        process(
            &json!({"requests": {"successful": [{"request_latency": 1.0}]}}),
            &RunIdentity::new("u-1", "job"),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            OpenSearchSink::new("not a url", "idx"),
            Err(SinkError::InvalidConfig(_))
        ));
        assert!(matches!(
            OpenSearchSink::new("ftp://search:21", "idx"),
            Err(SinkError::InvalidConfig(_))
        ));
        assert!(matches!(
            OpenSearchSink::new("http://localhost:9200", " "),
            Err(SinkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bulk_url() {
        let sink = OpenSearchSink::new("http://localhost:9200", "results").unwrap();
        assert_eq!(sink.bulk_url().as_str(), "http://localhost:9200/_bulk");
        assert_eq!(sink.index_name(), "results");

        let proxied = OpenSearchSink::new("https://search.example.com/os/", "results").unwrap();
        assert_eq!(proxied.bulk_url().as_str(), "https://search.example.com/os/_bulk");
    }

    #[test]
    fn test_bulk_body_pairs_actions_with_documents() {
        let records = records();
        let body = bulk_body("results", &records).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), records.len() * 2);
        assert!(body.ends_with('\n'));
        for pair in lines.chunks(2) {
            assert_eq!(pair[0], r#"{"index":{"_index":"results"}}"#);
            let doc: Value = serde_json::from_str(pair[1]).unwrap();
            assert_eq!(doc["uuid"], json!("u-1"));
        }

        let summary: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(summary["total_requests"], json!(1));
    }

    #[test]
    fn test_summarize_bulk_response() {
        let response = json!({
            "took": 3,
            "errors": true,
            "items": [
                {"index": {"_id": "a", "status": 201}},
                {"index": {"_id": "b", "status": 400, "error": {"type": "mapper_parsing_exception"}}},
                {"index": {"_id": "c", "status": 200}}
            ]
        });
        assert_eq!(
            summarize_bulk_response(&response, 3),
            IndexReport { indexed: 2, failed: 1 }
        );
        assert_eq!(
            summarize_bulk_response(&json!({}), 2),
            IndexReport { indexed: 0, failed: 2 }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let sink = OpenSearchSink::with_timeout(
            "http://127.0.0.1:1",
            "results",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = sink.index(&records()).await.unwrap_err();
        assert!(matches!(err, SinkError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let sink = OpenSearchSink::new("http://127.0.0.1:1", "results").unwrap();
        assert_eq!(sink.index(&[]).await.unwrap(), IndexReport::default());
    }
}
