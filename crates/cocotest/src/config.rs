//! Harness conventions and run-wide toggles.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the project build description, relative to the
/// tests directory the harness is run from.
pub const DEFAULT_BUILD_DESCRIPTION: &str = "../Makefile";

/// Fixed file-layout conventions of the test suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Path to the project build description (Makefile).
    pub build_description: PathBuf,

    /// Prefix applied to every project source so it resolves from the
    /// tests directory.
    pub project_root: String,

    /// Shim source standing in for the real entry point.
    pub mock_source: String,

    /// The project's real entry point, never compiled into a test.
    pub entry_point: String,

    /// Project flag dropped from the defaults; tests may add it back.
    pub filtered_flag: String,

    /// Extension of the reference transcript next to each test.
    pub reference_extension: String,

    /// Prefix of the temporary executables.
    pub temp_prefix: String,

    /// Per-process timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            build_description: PathBuf::from(DEFAULT_BUILD_DESCRIPTION),
            project_root: "../".to_string(),
            mock_source: "./testbench_mock.c".to_string(),
            entry_point: "main.c".to_string(),
            filtered_flag: "-DAVX2".to_string(),
            reference_extension: "out".to_string(),
            temp_prefix: "cocotest_".to_string(),
            timeout_secs: 0,
        }
    }
}

impl HarnessConfig {
    /// Use a different build description.
    pub fn with_build_description(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_description = path.into();
        self
    }

    /// Set the per-process timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The timeout as a `Duration`, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Toggles chosen on the command line for one run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOptions {
    /// Echo compiler invocations, binary paths and raw diagnostics.
    pub verbose: bool,

    /// Compiler diagnostics on a zero exit code are warnings, not failures.
    pub ignore_warnings: bool,

    /// Abort the run after the first halting verdict.
    pub stop_on_failure: bool,

    /// Whether a memory-checking wrapper was requested. Binaries are invoked
    /// directly either way; the flag is carried for reporting.
    pub valgrind: bool,
}
