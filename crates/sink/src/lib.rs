// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Indexing sinks for report records.
//!
//! This crate provides the [`RecordSink`] trait and the OpenSearch
//! implementation used to push a run's records to a search backend.
//! Sinks are best-effort: a failure is surfaced to the caller and never
//! affects the records themselves.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod opensearch;

pub use opensearch::OpenSearchSink;

use async_trait::async_trait;
use guidellm_report_core::OutputRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while indexing records.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backend could not be reached
    #[error("Cannot connect to {endpoint}: {reason}")]
    Unavailable {
        /// Backend endpoint
        endpoint: String,
        /// Underlying failure
        reason: String,
    },

    /// The backend refused the request
    #[error("Request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Some documents were not indexed
    #[error("{failed} of {total} documents were rejected")]
    Partial {
        /// Rejected documents
        failed: usize,
        /// Documents sent
        total: usize,
    },

    /// The sink was configured with unusable settings
    #[error("Invalid sink configuration: {0}")]
    InvalidConfig(String),

    /// Records or responses could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Outcome of an indexing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents accepted
    pub indexed: usize,
    /// Documents rejected
    pub failed: usize,
}

/// A destination for a run's output records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Index the records in order, summary first.
    async fn index(&self, records: &[OutputRecord]) -> Result<IndexReport>;
}
