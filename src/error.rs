// src/error.rs

use std::io;
use std::path::PathBuf;

/// Failures that end a parse run. No partial report is produced.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("cannot open log file '{}'", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading log input after line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// A line that matched a record shape but whose numeric field did not parse.
/// The line is skipped and the scan continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),
}
