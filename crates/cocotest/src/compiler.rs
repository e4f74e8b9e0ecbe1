//! External compiler invocation and result classification.

use crate::error::HarnessResult;
use crate::plan::ResolvedPlan;
use crate::runner::run_process;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Result of one compiler run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileResult {
    pub exit_code: i32,
    pub stderr: String,
    /// Exit code was zero.
    pub succeeded: bool,
    /// Exit code was zero but the compiler printed diagnostics.
    pub had_warnings: bool,
}

impl CompileResult {
    /// Build from the raw exit code and stderr.
    pub fn new(exit_code: i32, stderr: String) -> Self {
        let succeeded = exit_code == 0;
        Self {
            had_warnings: succeeded && !stderr.is_empty(),
            exit_code,
            stderr,
            succeeded,
        }
    }

    /// Apply the warnings policy.
    pub fn status(&self, ignore_warnings: bool) -> CompileStatus {
        if !self.succeeded {
            CompileStatus::Failed(CompileFailure::ExitCode(self.exit_code))
        } else if self.had_warnings && !ignore_warnings {
            CompileStatus::Failed(CompileFailure::Diagnostics)
        } else if self.had_warnings {
            CompileStatus::Warnings
        } else {
            CompileStatus::Clean
        }
    }
}

/// Classified compile outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    /// No diagnostics.
    Clean,
    /// Diagnostics were printed and warnings are ignored.
    Warnings,
    /// The test cannot run.
    Failed(CompileFailure),
}

/// Why a compile counts as failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "reason", content = "exit_code")]
pub enum CompileFailure {
    /// Nonzero exit code.
    ExitCode(i32),
    /// Zero exit code, but diagnostics on stderr and warnings are fatal.
    Diagnostics,
}

/// Invokes the external compiler for a resolved plan.
pub struct CompilerInvoker;

impl CompilerInvoker {
    /// Compile the plan into `output`.
    pub async fn compile(
        plan: &ResolvedPlan,
        output: &Path,
        timeout: Option<Duration>,
    ) -> HarnessResult<CompileResult> {
        let args = plan.compiler_args(output);
        debug!(compiler = %plan.compiler, args = args.len(), "Invoking compiler");

        let result = run_process(OsStr::new(&plan.compiler), &args, timeout).await?;
        Ok(CompileResult::new(result.exit_code, result.stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_clean_compile() {
        let result = CompileResult::new(0, String::new());
        assert!(result.succeeded);
        assert!(!result.had_warnings);
        assert_eq!(result.status(false), CompileStatus::Clean);
    }

    #[test]
    fn test_warnings_policy() {
        let result = CompileResult::new(0, "warning: unused variable".to_string());
        assert!(result.succeeded);
        assert!(result.had_warnings);
        assert_eq!(result.status(true), CompileStatus::Warnings);
        assert_eq!(
            result.status(false),
            CompileStatus::Failed(CompileFailure::Diagnostics)
        );
    }

    #[test]
    fn test_nonzero_exit_always_fails() {
        let result = CompileResult::new(1, "error: expected ';'".to_string());
        assert!(!result.succeeded);
        assert!(!result.had_warnings);
        assert_eq!(
            result.status(true),
            CompileStatus::Failed(CompileFailure::ExitCode(1))
        );
    }

    #[tokio::test]
    async fn test_compile_passes_arguments() {
        // `echo` stands in for the compiler; it prints its argv on stdout
        // and exits cleanly.
        let plan = ResolvedPlan {
            compiler: "echo".to_string(),
            flags: vec!["-DX".to_string()],
            sources: vec![PathBuf::from("a.c")],
            libs: vec!["-lm".to_string()],
            test_file: PathBuf::from("t.c"),
            standalone: false,
        };
        let result = CompilerInvoker::compile(&plan, Path::new("out"), None)
            .await
            .expect("compile failed");
        assert_eq!(result.status(false), CompileStatus::Clean);
    }
}
