//! Per-test verdicts.

use crate::compiler::CompileFailure;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final classification of one test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    CompileFail,
    RuntimeFail,
    DiffFail,
    /// The reference transcript is missing: a defect of the suite, not of
    /// the code under test.
    ReferenceMissing,
    SkippedMissingFile,
    SkippedNoHeader,
}

impl Verdict {
    /// Get the verdict name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::CompileFail => "COMPILE_FAIL",
            Verdict::RuntimeFail => "RUNTIME_FAIL",
            Verdict::DiffFail => "DIFF_FAIL",
            Verdict::ReferenceMissing => "REFERENCE_MISSING",
            Verdict::SkippedMissingFile => "SKIPPED_MISSING_FILE",
            Verdict::SkippedNoHeader => "SKIPPED_NO_HEADER",
        }
    }

    pub fn passed(&self) -> bool {
        *self == Verdict::Pass
    }

    /// Whether stop-on-failure aborts the run after this verdict.
    ///
    /// Every verdict other than a pass halts, skips included.
    pub fn halts_run(&self) -> bool {
        !self.passed()
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline stage a process failure happened in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Compile,
    Execute,
}

/// What went wrong, with the text surfaced to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Failure {
    /// The test file is not a readable file.
    MissingFile { reason: String },
    /// No leading `/** ... */` header.
    NoHeader,
    /// The compiler rejected the test.
    Compile {
        failure: CompileFailure,
        stderr: String,
    },
    /// The test binary exited nonzero or wrote to stderr.
    Runtime { exit_code: i32, stderr: String },
    /// A process could not be run to completion (spawn error, timeout).
    Process { stage: Stage, message: String },
    /// Stdout differs from the reference transcript.
    Diff { diff: String },
    /// The reference transcript could not be read.
    ReferenceMissing { path: PathBuf, reason: String },
}

impl Failure {
    /// Verdict this failure maps to.
    pub fn verdict(&self) -> Verdict {
        match self {
            Failure::MissingFile { .. } => Verdict::SkippedMissingFile,
            Failure::NoHeader => Verdict::SkippedNoHeader,
            Failure::Compile { .. } => Verdict::CompileFail,
            Failure::Process {
                stage: Stage::Compile,
                ..
            } => Verdict::CompileFail,
            Failure::Runtime { .. }
            | Failure::Process {
                stage: Stage::Execute,
                ..
            } => Verdict::RuntimeFail,
            Failure::Diff { .. } => Verdict::DiffFail,
            Failure::ReferenceMissing { .. } => Verdict::ReferenceMissing,
        }
    }
}

/// Report for one test file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestReport {
    pub test_file: PathBuf,

    pub verdict: Verdict,

    /// Set for every non-passing verdict.
    pub failure: Option<Failure>,

    /// Compiled with diagnostics that were ignored.
    pub had_warnings: bool,

    /// Digest of the resolved plan, once the header was parsed.
    pub plan_digest: Option<String>,

    /// Description lines from the test header.
    pub description: Vec<String>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl TestReport {
    /// A passing report.
    pub fn pass(test_file: PathBuf) -> Self {
        Self {
            test_file,
            verdict: Verdict::Pass,
            failure: None,
            had_warnings: false,
            plan_digest: None,
            description: Vec::new(),
            duration_ms: 0,
        }
    }

    /// A report for `failure`.
    pub fn failed(test_file: PathBuf, failure: Failure) -> Self {
        Self {
            verdict: failure.verdict(),
            failure: Some(failure),
            ..Self::pass(test_file)
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}
