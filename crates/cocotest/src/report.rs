//! Progress events and their console rendering.
//!
//! The controller emits [`ReportEvent`]s through a [`Reporter`] as the run
//! progresses. [`render`] turns an event into colored console lines; it is a
//! pure function so the whole report format can be tested without a
//! terminal.

use crate::compiler::CompileFailure;
use crate::controller::RunSummary;
use crate::error::HarnessResult;
use crate::verdict::{Failure, Stage, TestReport, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Something the controller wants the user to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// A test iteration started.
    Started { test_file: PathBuf },
    /// The compiler is about to run.
    Compiling {
        test_file: PathBuf,
        binary: PathBuf,
        command_line: String,
    },
    /// Compiled, but the compiler printed diagnostics that are ignored.
    CompiledWithWarnings { test_file: PathBuf, stderr: String },
    /// The test binary is about to run.
    Running { binary: PathBuf },
    /// The test reached its verdict.
    Finished(TestReport),
}

/// Receives progress events in order.
pub trait Reporter {
    fn emit(&mut self, event: &ReportEvent);
}

/// Collects events, mostly for tests.
impl Reporter for Vec<ReportEvent> {
    fn emit(&mut self, event: &ReportEvent) {
        self.push(event.clone());
    }
}

/// Green background.
pub fn green(s: &str) -> String {
    format!("\x1b[42m{s}\x1b[0m")
}

/// Yellow background.
pub fn yellow(s: &str) -> String {
    format!("\x1b[43m{s}\x1b[0m")
}

/// Red background, white text.
pub fn red(s: &str) -> String {
    format!("\x1b[41m\x1b[37m{s}\x1b[0m")
}

/// Output stream of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One line (or diagnostic body) of console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    fn out(text: String) -> Self {
        Self {
            stream: Stream::Stdout,
            text,
        }
    }

    fn err(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stderr,
            text: text.into(),
        }
    }
}

/// Render an event as console lines.
///
/// Progress lines only appear in verbose mode. Diagnostic bodies of hard
/// failures are always shown; warnings and diffs only when verbose.
pub fn render(event: &ReportEvent, verbose: bool) -> Vec<Line> {
    match event {
        ReportEvent::Started { test_file } => {
            if verbose {
                vec![Line::out(yellow(&format!("Test {}", test_file.display())))]
            } else {
                Vec::new()
            }
        }
        ReportEvent::Compiling {
            test_file,
            binary,
            command_line,
        } => {
            if verbose {
                vec![
                    Line::out(format!(
                        "Compiling {} to {}",
                        test_file.display(),
                        binary.display()
                    )),
                    Line::out("Compiler command:".to_string()),
                    Line::out(command_line.clone()),
                ]
            } else {
                Vec::new()
            }
        }
        ReportEvent::CompiledWithWarnings { test_file, stderr } => {
            let mut lines = vec![Line::out(yellow(&format!(
                "Test {} compiled with warnings",
                test_file.display()
            )))];
            if verbose {
                lines.push(Line::err(stderr.clone()));
            }
            lines
        }
        ReportEvent::Running { binary } => {
            if verbose {
                vec![Line::out(format!("Running {}", binary.display()))]
            } else {
                Vec::new()
            }
        }
        ReportEvent::Finished(report) => render_report(report, verbose),
    }
}

fn render_report(report: &TestReport, verbose: bool) -> Vec<Line> {
    let file = report.test_file.display();
    let Some(failure) = &report.failure else {
        return vec![Line::out(green(&format!("Test {file} OK")))];
    };

    match failure {
        Failure::MissingFile { .. } => {
            vec![Line::out(red(&format!("Skipping non-existing file {file}")))]
        }
        Failure::NoHeader => {
            vec![Line::out(red(&format!("File {file} does not contain header")))]
        }
        Failure::Compile { failure, stderr } => {
            let reason = match failure {
                CompileFailure::ExitCode(code) => format!("retval = {code}"),
                CompileFailure::Diagnostics => "stderr non-empty".to_string(),
            };
            let mut lines = vec![Line::out(red(&format!(
                "Test {file} failed to compile ({reason})"
            )))];
            if !stderr.is_empty() {
                lines.push(Line::err(stderr.clone()));
            }
            lines
        }
        Failure::Runtime { exit_code, stderr } => {
            let mut lines = Vec::new();
            if !stderr.is_empty() {
                lines.push(Line::out(red(&format!("Test {file} failed (stderr non-empty)"))));
            }
            if *exit_code != 0 {
                lines.push(Line::out(red(&format!(
                    "Test {file} failed (retval = {exit_code})"
                ))));
            }
            if !stderr.is_empty() {
                lines.push(Line::err(stderr.clone()));
            }
            lines
        }
        Failure::Process { stage, message } => {
            let what = match stage {
                Stage::Compile => "failed to compile",
                Stage::Execute => "failed",
            };
            vec![
                Line::out(red(&format!("Test {file} {what} ({message})"))),
                Line::err(message.clone()),
            ]
        }
        Failure::Diff { diff } => {
            let mut lines = vec![Line::out(red(&format!("Test {file} failed (diff mismatch)")))];
            if verbose {
                lines.push(Line::err(diff.clone()));
            }
            lines
        }
        Failure::ReferenceMissing { path, reason } => vec![Line::out(red(&format!(
            "Test {file} cannot be verified (reference output {} unreadable: {reason})",
            path.display()
        )))],
    }
}

/// Closing summary line of a run.
pub fn render_summary(summary: &RunSummary) -> Line {
    let mut parts = vec![format!("{} passed", summary.passed_count())];
    for (verdict, count) in summary.counts() {
        if verdict != Verdict::Pass {
            parts.push(format!("{count} {}", verdict.name()));
        }
    }
    if summary.stopped_early {
        parts.push("stopped early".to_string());
    }

    let text = format!("{} test(s): {}", summary.reports.len(), parts.join(", "));
    if summary.success() {
        Line::out(green(&text))
    } else {
        Line::out(red(&text))
    }
}

/// Machine-readable run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_at: DateTime<Utc>,
    pub success: bool,
    pub stopped_early: bool,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub tests: Vec<TestReport>,
    /// Harness failure that ended the run before every test was reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Build the report for a finished run.
    pub fn new(summary: &RunSummary) -> Self {
        Self {
            run_id: summary.run_id.clone(),
            run_at: Utc::now(),
            success: summary.success(),
            stopped_early: summary.stopped_early,
            duration_ms: summary.duration_ms,
            total: summary.reports.len(),
            passed: summary.passed_count(),
            failed: summary.failed_count(),
            tests: summary.reports.clone(),
            error: None,
        }
    }

    /// Mark the run as aborted by a harness failure.
    pub fn with_error(mut self, error: impl std::fmt::Display) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`.
    pub fn write(&self, path: &Path) -> HarnessResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_colors() {
        assert_eq!(green("ok"), "\x1b[42mok\x1b[0m");
        assert_eq!(yellow("w"), "\x1b[43mw\x1b[0m");
        assert_eq!(red("x"), "\x1b[41m\x1b[37mx\x1b[0m");
    }

    #[test]
    fn test_progress_only_when_verbose() {
        let event = ReportEvent::Running {
            binary: PathBuf::from("/tmp/cocotest_x"),
        };
        assert!(render(&event, false).is_empty());
        assert_eq!(texts(&render(&event, true)), vec!["Running /tmp/cocotest_x"]);
    }

    #[test]
    fn test_pass_line() {
        let event = ReportEvent::Finished(TestReport::pass(PathBuf::from("t.c")));
        assert_eq!(texts(&render(&event, false)), vec![green("Test t.c OK")]);
    }

    #[test]
    fn test_compile_failure_always_shows_stderr() {
        let event = ReportEvent::Finished(TestReport::failed(
            PathBuf::from("t.c"),
            Failure::Compile {
                failure: CompileFailure::ExitCode(1),
                stderr: "t.c:1: error".to_string(),
            },
        ));
        let lines = render(&event, false);
        assert_eq!(lines[0].text, red("Test t.c failed to compile (retval = 1)"));
        assert_eq!(lines[1], Line::err("t.c:1: error"));
    }

    #[test]
    fn test_runtime_failure_lines() {
        let event = ReportEvent::Finished(TestReport::failed(
            PathBuf::from("t.c"),
            Failure::Runtime {
                exit_code: 3,
                stderr: "boom".to_string(),
            },
        ));
        assert_eq!(
            texts(&render(&event, false)),
            vec![
                red("Test t.c failed (stderr non-empty)").as_str(),
                red("Test t.c failed (retval = 3)").as_str(),
                "boom",
            ]
        );
    }

    #[test]
    fn test_diff_body_only_when_verbose() {
        let event = ReportEvent::Finished(TestReport::failed(
            PathBuf::from("t.c"),
            Failure::Diff {
                diff: "-a\n+b\n".to_string(),
            },
        ));
        assert_eq!(render(&event, false).len(), 1);
        let verbose = render(&event, true);
        assert_eq!(verbose.len(), 2);
        assert_eq!(verbose[1], Line::err("-a\n+b\n"));
    }

    #[test]
    fn test_aborted_report_is_not_success() {
        let summary = RunSummary {
            run_id: "run1".to_string(),
            reports: vec![TestReport::pass(PathBuf::from("t.c"))],
            stopped_early: true,
            duration_ms: 5,
        };
        let report = RunReport::new(&summary);
        assert!(report.success);
        assert!(!report.to_json().unwrap().contains("\"error\""));

        let aborted = report.with_error("cannot create temporary executable");
        assert!(!aborted.success);
        assert_eq!(aborted.total, 1);
        let json = aborted.to_json().unwrap();
        assert!(json.contains("\"error\": \"cannot create temporary executable\""));
    }

    #[test]
    fn test_reference_missing_is_distinct_from_diff() {
        let event = ReportEvent::Finished(TestReport::failed(
            PathBuf::from("t.c"),
            Failure::ReferenceMissing {
                path: PathBuf::from("t.out"),
                reason: "No such file or directory".to_string(),
            },
        ));
        let lines = render(&event, false);
        assert!(lines[0].text.contains("cannot be verified"));
        assert!(!lines[0].text.contains("diff mismatch"));
    }
}
