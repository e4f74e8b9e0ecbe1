//! Error types for the harness.
//!
//! Only failures of the harness itself live here. Per-test outcomes such as a
//! compile failure or a diff mismatch are [`Verdict`](crate::Verdict)s, not
//! errors.

use crate::controller::RunSummary;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the test pipeline.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The project build description could not be read.
    #[error("cannot read build description {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child process (compiler or test binary) could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A child process exceeded the configured timeout.
    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    /// The temporary executable could not be removed.
    #[error("failed to remove temporary executable {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A harness failure stopped the run midway. `summary` holds the tests
    /// that finished before it.
    #[error("test run aborted after {completed} test(s): {source}")]
    Aborted {
        completed: usize,
        summary: Box<RunSummary>,
        #[source]
        source: Box<HarnessError>,
    },

    /// The JSON report could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
