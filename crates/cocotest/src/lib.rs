//! cocotest - build-and-verify harness for the C test suite
//!
//! For every test source the harness:
//! - Resolves compiler settings from the project Makefile
//! - Applies the directives in the test's leading `/** ... */` comment
//! - Compiles the test into a temporary executable and runs it
//! - Compares stdout with the stored `.out` transcript, or only checks for
//!   a clean exit for stand-alone tests

pub mod artifact;
pub mod build_config;
pub mod compiler;
pub mod config;
pub mod controller;
pub mod diff;
pub mod directive;
pub mod error;
pub mod plan;
pub mod report;
pub mod runner;
pub mod telemetry;
pub mod verdict;
pub mod verifier;

// Re-export key types
pub use artifact::TempArtifact;
pub use build_config::BuildConfig;
pub use compiler::{CompileFailure, CompileResult, CompileStatus, CompilerInvoker};
pub use config::{HarnessConfig, RunOptions};
pub use controller::{RunController, RunSummary};
pub use diff::LineDiff;
pub use directive::{Directive, TestDirectives};
pub use error::{HarnessError, HarnessResult};
pub use plan::ResolvedPlan;
pub use report::{render, render_summary, Line, ReportEvent, Reporter, RunReport, Stream};
pub use runner::{ExecutionResult, ExecutionRunner};
pub use telemetry::init_tracing;
pub use verdict::{Failure, Stage, TestReport, Verdict};
pub use verifier::{Verifier, VerifyOutcome};
