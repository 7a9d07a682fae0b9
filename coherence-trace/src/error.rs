//! Trace loading and report-writing errors.

use thiserror::Error;

/// Everything that can go wrong turning a trace file into [`TraceRecord`]s
/// or writing a results report.
///
/// [`TraceRecord`]: crate::TraceRecord
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to open trace file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read line {line} of {path}: {source}")]
    Read {
        path: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
