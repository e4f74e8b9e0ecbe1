//! Test run orchestration.
//!
//! Each test walks the same sequence: existence check, header parse, plan
//! merge, compile, execute, verify. The first failing stage decides the
//! verdict. Tests run strictly one after another in input order.

use crate::artifact::TempArtifact;
use crate::build_config::BuildConfig;
use crate::compiler::{CompileStatus, CompilerInvoker};
use crate::config::{HarnessConfig, RunOptions};
use crate::directive::TestDirectives;
use crate::error::{HarnessError, HarnessResult};
use crate::plan::ResolvedPlan;
use crate::report::{ReportEvent, Reporter};
use crate::runner::ExecutionRunner;
use crate::verdict::{Failure, Stage, TestReport, Verdict};
use crate::verifier::{Verifier, VerifyOutcome};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique id of this run.
    pub run_id: String,

    /// One report per test reached, in input order.
    pub reports: Vec<TestReport>,

    /// The run was aborted by stop-on-failure.
    pub stopped_early: bool,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Number of tests that passed.
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    /// Number of tests that did not pass.
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed()).count()
    }

    /// Whether every test reached passed.
    pub fn success(&self) -> bool {
        self.reports.iter().all(TestReport::passed)
    }

    /// Number of tests per verdict.
    pub fn counts(&self) -> BTreeMap<Verdict, usize> {
        let mut counts = BTreeMap::new();
        for report in &self.reports {
            *counts.entry(report.verdict).or_insert(0) += 1;
        }
        counts
    }

    /// Verdicts in report order.
    pub fn verdicts(&self) -> Vec<Verdict> {
        self.reports.iter().map(|r| r.verdict).collect()
    }
}

/// Drives tests through the build-and-verify pipeline.
pub struct RunController {
    build: BuildConfig,
    config: HarnessConfig,
    options: RunOptions,
}

impl RunController {
    /// Create a controller for an already resolved project configuration.
    pub fn new(build: BuildConfig, config: HarnessConfig, options: RunOptions) -> Self {
        Self {
            build,
            config,
            options,
        }
    }

    /// Resolve the build description named in `config` and create a
    /// controller. Fails before any test runs if it cannot be read.
    pub fn from_config(config: HarnessConfig, options: RunOptions) -> HarnessResult<Self> {
        let build = BuildConfig::load(&config)?;
        Ok(Self::new(build, config, options))
    }

    /// The project configuration shared by every test.
    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    /// Run every test in order, emitting progress to `reporter`.
    ///
    /// Only harness failures (e.g. a temporary executable that cannot be
    /// removed) are errors; test failures are verdicts. A harness failure
    /// ends the run with [`HarnessError::Aborted`], which still carries the
    /// reports of the tests finished before it.
    pub async fn run<R: Reporter + ?Sized>(
        &self,
        test_files: &[PathBuf],
        reporter: &mut R,
    ) -> HarnessResult<RunSummary> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        info!(
            run_id = %run_id,
            tests = test_files.len(),
            compiler = %self.build.compiler,
            stop_on_failure = self.options.stop_on_failure,
            ignore_warnings = self.options.ignore_warnings,
            valgrind = self.options.valgrind,
            "Starting test run"
        );

        let mut reports = Vec::with_capacity(test_files.len());
        let mut stopped_early = false;

        for test_file in test_files {
            let span = info_span!("test", file = %test_file.display());
            let report = match self.run_test(test_file, reporter).instrument(span).await {
                Ok(report) => report,
                Err(source) => {
                    error!(
                        run_id = %run_id,
                        test = %test_file.display(),
                        error = %source,
                        "Test run aborted"
                    );
                    let summary = RunSummary {
                        run_id,
                        reports,
                        stopped_early: true,
                        duration_ms: start.elapsed().as_millis() as u64,
                    };
                    return Err(HarnessError::Aborted {
                        completed: summary.reports.len(),
                        summary: Box::new(summary),
                        source: Box::new(source),
                    });
                }
            };

            info!(
                test = %test_file.display(),
                verdict = %report.verdict,
                duration_ms = report.duration_ms,
                "Test finished"
            );
            reporter.emit(&ReportEvent::Finished(report.clone()));

            let halt = self.options.stop_on_failure && report.verdict.halts_run();
            reports.push(report);
            if halt {
                info!(run_id = %run_id, "Stopping after first failure");
                stopped_early = true;
                break;
            }
        }

        let summary = RunSummary {
            run_id,
            reports,
            stopped_early,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            run_id = %summary.run_id,
            passed = summary.passed_count(),
            failed = summary.failed_count(),
            "Test run completed"
        );
        Ok(summary)
    }

    /// Take one test from START to its verdict.
    pub async fn run_test<R: Reporter + ?Sized>(
        &self,
        test_file: &Path,
        reporter: &mut R,
    ) -> HarnessResult<TestReport> {
        let start = Instant::now();
        reporter.emit(&ReportEvent::Started {
            test_file: test_file.to_path_buf(),
        });

        let mut report = match self.resolve(test_file).await {
            Ok((plan, directives)) => {
                let digest = plan.digest();
                debug!(digest = %digest, plan = ?plan, "Resolved plan");

                // The artifact brackets COMPILE..VERIFY; dropping it on unwind
                // removes the file as well.
                let artifact = TempArtifact::create(&self.config.temp_prefix)?;
                let mut report = self.build_and_verify(&plan, artifact.path(), reporter).await;
                artifact.release()?;

                report.plan_digest = Some(digest);
                report.description = directives.description;
                report
            }
            Err(failure) => TestReport::failed(test_file.to_path_buf(), failure),
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Existence check, header parse and plan merge.
    async fn resolve(&self, test_file: &Path) -> Result<(ResolvedPlan, TestDirectives), Failure> {
        let is_file = tokio::fs::metadata(test_file)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            info!(test = %test_file.display(), "Skipping non-existing file");
            return Err(Failure::MissingFile {
                reason: "not a file".to_string(),
            });
        }

        let bytes = tokio::fs::read(test_file)
            .await
            .map_err(|e| Failure::MissingFile {
                reason: e.to_string(),
            })?;
        let content = String::from_utf8_lossy(&bytes);

        let directives = TestDirectives::parse(&content, &self.config).ok_or_else(|| {
            info!(test = %test_file.display(), "Test file has no header");
            Failure::NoHeader
        })?;

        let plan = ResolvedPlan::merge(&self.build, &directives, test_file);
        Ok((plan, directives))
    }

    /// COMPILE, EXECUTE and VERIFY against `binary`.
    async fn build_and_verify<R: Reporter + ?Sized>(
        &self,
        plan: &ResolvedPlan,
        binary: &Path,
        reporter: &mut R,
    ) -> TestReport {
        let test_file = plan.test_file.clone();
        let timeout = self.config.timeout();

        reporter.emit(&ReportEvent::Compiling {
            test_file: test_file.clone(),
            binary: binary.to_path_buf(),
            command_line: plan.command_line(binary),
        });

        let compiled = match CompilerInvoker::compile(plan, binary, timeout).await {
            Ok(compiled) => compiled,
            Err(e) => {
                return TestReport::failed(
                    test_file,
                    Failure::Process {
                        stage: Stage::Compile,
                        message: e.to_string(),
                    },
                )
            }
        };

        let had_warnings = match compiled.status(self.options.ignore_warnings) {
            CompileStatus::Clean => false,
            CompileStatus::Warnings => {
                info!(test = %test_file.display(), "Compiled with warnings");
                reporter.emit(&ReportEvent::CompiledWithWarnings {
                    test_file: test_file.clone(),
                    stderr: compiled.stderr.clone(),
                });
                true
            }
            CompileStatus::Failed(failure) => {
                return TestReport::failed(
                    test_file,
                    Failure::Compile {
                        failure,
                        stderr: compiled.stderr,
                    },
                )
            }
        };

        reporter.emit(&ReportEvent::Running {
            binary: binary.to_path_buf(),
        });
        let executed = match ExecutionRunner::execute(binary, timeout).await {
            Ok(executed) => executed,
            Err(e) => {
                return TestReport::failed(
                    test_file,
                    Failure::Process {
                        stage: Stage::Execute,
                        message: e.to_string(),
                    },
                )
            }
        };

        if !executed.is_clean() {
            return TestReport::failed(
                test_file,
                Failure::Runtime {
                    exit_code: executed.exit_code,
                    stderr: executed.stderr,
                },
            );
        }

        let failure = match Verifier::verify(plan, &executed.stdout, &self.config.reference_extension).await {
            VerifyOutcome::Standalone | VerifyOutcome::Match => None,
            VerifyOutcome::Mismatch { diff } => Some(Failure::Diff { diff }),
            VerifyOutcome::ReferenceMissing { path, reason } => {
                Some(Failure::ReferenceMissing { path, reason })
            }
        };

        let mut report = match failure {
            Some(failure) => TestReport::failed(test_file, failure),
            None => TestReport::pass(test_file),
        };
        report.had_warnings = had_warnings;
        report
    }
}
