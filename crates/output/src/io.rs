//! I/O operations for benchmark documents and report records.
//!
//! This module reads the raw result document from disk and writes the
//! rendered records to a file or standard output.

use guidellm_report_core::{Error, OutputRecord, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Default input file name written by the benchmarking tool.
pub const DEFAULT_RESULTS_FILE: &str = "benchmarks.json";

/// Read and parse a benchmark document.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if the file cannot be read and
/// [`Error::InputParse`] if it is not valid JSON.
pub fn read_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::input_not_found(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "Read benchmark document");
    parse_document(&content)
}

/// Parse a benchmark document from text.
pub fn parse_document(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(Error::InputParse)
}

/// Render records as a pretty-printed JSON array with a trailing newline.
pub fn render_json(records: &[OutputRecord]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(records).map_err(Error::Serialization)?;
    json.push('\n');
    Ok(json)
}

/// Write rendered output to `path`, or to standard output when `None`.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            info!(path = %path.display(), "Results written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidellm_report_core::{process, RunIdentity};
    use serde_json::json;

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmarks.json");
        fs::write(&path, "{\"benchmarks\": [").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, Error::InputParse(_)));
    }

    #[test]
    fn test_read_and_write_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("benchmarks.json");
        fs::write(
            &input,
            json!({"benchmarks": [{"requests": {"successful": [{"request_latency": 1.0}]}}]}).to_string(),
        )
        .unwrap();

        let document = read_document(&input).unwrap();
        let records = process(&document, &RunIdentity::new("u", "j")).unwrap();
        let rendered = render_json(&records).unwrap();

        let output = dir.path().join("out.json");
        write_output(&rendered, Some(output.as_path())).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, rendered);
        assert!(written.ends_with("]\n"));

        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["successful_requests"], json!(1));
    }

    #[test]
    fn test_render_uses_two_space_indent() {
        let records = process(&json!({"requests": []}), &RunIdentity::default()).unwrap();
        let rendered = render_json(&records).unwrap();
        assert!(rendered.starts_with("[\n  {\n    \"uuid\": \"\""));
    }
}
