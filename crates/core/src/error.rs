// Copyright 2025 GuideLLM Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for report generation.
//!
//! Only fatal conditions live here. A statistic that cannot be computed
//! because its inputs are missing is not an error; it surfaces as `None`
//! and serializes as `null`.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while turning a benchmark document into records.
#[derive(Debug, Error)]
pub enum Error {
    /// The input document could not be read.
    #[error("Input not found: {}: {source}", path.display())]
    InputNotFound {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The input document is not well-formed JSON.
    #[error("Invalid JSON in input: {0}")]
    InputParse(#[source] serde_json::Error),

    /// No benchmark data was found under any known location.
    #[error("No benchmarks found in the document (tried: {})", tried.join(", "))]
    SectionNotFound {
        /// Lookup paths that were attempted, in order
        tried: Vec<String>,
    },

    /// The produced records could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an `InputNotFound` error for the given path.
    pub fn input_not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InputNotFound {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the document had no usable benchmark data.
    pub fn is_section_not_found(&self) -> bool {
        matches!(self, Self::SectionNotFound { .. })
    }
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, Error>;
