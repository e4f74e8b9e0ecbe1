//! Output verification against reference transcripts.

use crate::diff::LineDiff;
use crate::plan::ResolvedPlan;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of the verification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Standalone test: a clean exit is all that is checked.
    Standalone,
    /// Stdout matches the reference transcript.
    Match,
    /// Stdout differs; `diff` is the unified diff of reference vs. stdout.
    Mismatch { diff: String },
    /// The reference transcript could not be read.
    ReferenceMissing { path: PathBuf, reason: String },
}

impl VerifyOutcome {
    /// Whether the test passes this stage.
    pub fn passed(&self) -> bool {
        matches!(self, VerifyOutcome::Standalone | VerifyOutcome::Match)
    }
}

/// Compares test output with its stored transcript.
pub struct Verifier;

impl Verifier {
    /// Reference transcript of a test: same base name, `extension`.
    pub fn reference_path(test_file: &Path, extension: &str) -> PathBuf {
        test_file.with_extension(extension)
    }

    /// Byte-exact, line-wise comparison of a reference transcript with
    /// captured stdout.
    pub fn compare(reference: &[u8], stdout: &[u8], reference_label: &str) -> VerifyOutcome {
        let diff = LineDiff::compute(reference, stdout);
        if diff.is_empty() {
            VerifyOutcome::Match
        } else {
            debug!(changed_lines = diff.changed_lines(), "Output differs from reference");
            VerifyOutcome::Mismatch {
                diff: diff.unified(reference_label, "stdout"),
            }
        }
    }

    /// Verify a finished run of `plan` that produced `stdout`.
    pub async fn verify(plan: &ResolvedPlan, stdout: &[u8], extension: &str) -> VerifyOutcome {
        if plan.standalone {
            return VerifyOutcome::Standalone;
        }

        let path = Self::reference_path(&plan.test_file, extension);
        match tokio::fs::read(&path).await {
            Ok(reference) => Self::compare(&reference, stdout, &path.display().to_string()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Reference transcript unreadable");
                VerifyOutcome::ReferenceMissing {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }
}
