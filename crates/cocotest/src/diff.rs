//! Line-oriented diff of raw output with unified rendering.
//!
//! Lines are byte slices split after each `\n` and keep their terminators,
//! so a missing trailing newline is a difference like any other. Nothing is
//! decoded before comparison; invalid UTF-8 only gets replaced when the diff
//! is rendered for display.

use similar::{Algorithm, ChangeTag, DiffTag, TextDiff};
use std::time::Duration;

/// Lines of unchanged context around each hunk.
pub const CONTEXT: usize = 3;

/// Upper bound on the time spent looking for a minimal edit script. Past it
/// the diff is still correct, just not minimal.
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Difference between two outputs.
pub struct LineDiff<'a> {
    diff: TextDiff<'a, 'a, 'a, [u8]>,
}

impl<'a> LineDiff<'a> {
    /// Compute the Myers line diff of `old` against `new`.
    pub fn compute(old: &'a [u8], new: &'a [u8]) -> Self {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(DIFF_TIMEOUT)
            .diff_lines(old, new);
        Self { diff }
    }

    /// No line differs.
    pub fn is_empty(&self) -> bool {
        self.diff.ops().iter().all(|op| op.tag() == DiffTag::Equal)
    }

    /// Number of inserted plus deleted lines.
    pub fn changed_lines(&self) -> usize {
        self.diff
            .iter_all_changes()
            .filter(|change| change.tag() != ChangeTag::Equal)
            .count()
    }

    /// Render as a unified diff with [`CONTEXT`] lines of context.
    ///
    /// Returns an empty string when the outputs are equal.
    pub fn unified(&'a self, old_label: &str, new_label: &str) -> String {
        if self.is_empty() {
            return String::new();
        }
        self.diff
            .unified_diff()
            .context_radius(CONTEXT)
            .header(old_label, new_label)
            .to_string()
    }
}

impl std::fmt::Debug for LineDiff<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineDiff")
            .field("changed_lines", &self.changed_lines())
            .finish()
    }
}
