//! cocotest - compile, run and verify C test sources
//!
//! ```text
//! cocotest [-v] [-w] [-s] [--novalgrind] TEST...
//! ```
//!
//! Each `TEST` is a C source with a leading `/** ... */` header. Its stdout
//! is compared with `TEST.out` unless the header marks it as a stand-alone
//! test executable.

use anyhow::{Context, Result};
use clap::Parser;
use cocotest::{
    render, render_summary, HarnessConfig, HarnessError, Line, ReportEvent, Reporter,
    RunController, RunOptions, RunReport, RunSummary, Stream,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "cocotest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build-and-verify harness for the C test suite", long_about = None)]
struct Cli {
    /// Test source (*.c) files
    #[arg(value_name = "TEST", required = true, num_args = 1..)]
    testfiles: Vec<PathBuf>,

    /// Do not use valgrind
    #[arg(long)]
    novalgrind: bool,

    /// Echo compiler commands, binary paths and diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Ignore GCC warnings
    #[arg(short = 'w', long)]
    ignore_gcc_warnings: bool,

    /// Stop on first failure
    #[arg(short, long)]
    stop: bool,

    /// Project build description
    #[arg(long, env = "COCOTEST_MAKEFILE", default_value = cocotest::config::DEFAULT_BUILD_DESCRIPTION)]
    makefile: PathBuf,

    /// Kill the compiler or test binary after this many seconds (0 = never)
    #[arg(long, env = "COCOTEST_TIMEOUT", default_value = "0")]
    timeout: u64,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Prints rendered events to the terminal.
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn print(line: &Line) {
        match line.stream {
            Stream::Stdout => println!("{}", line.text),
            Stream::Stderr => eprintln!("{}", line.text),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&mut self, event: &ReportEvent) {
        for line in render(event, self.verbose) {
            Self::print(&line);
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    cocotest::init_tracing(cli.json, cli.verbose);

    let config = HarnessConfig::default()
        .with_build_description(&cli.makefile)
        .with_timeout_secs(cli.timeout);
    let options = RunOptions {
        verbose: cli.verbose,
        ignore_warnings: cli.ignore_gcc_warnings,
        stop_on_failure: cli.stop,
        valgrind: !cli.novalgrind,
    };

    let controller = RunController::from_config(config, options)
        .with_context(|| format!("Failed to load build description {}", cli.makefile.display()))?;

    let mut console = ConsoleReporter {
        verbose: cli.verbose,
    };
    let summary = match controller.run(&cli.testfiles, &mut console).await {
        Ok(summary) => summary,
        Err(HarnessError::Aborted {
            summary, source, ..
        }) => {
            // Tests finished before the failure are still reported.
            ConsoleReporter::print(&render_summary(&summary));
            if let Some(path) = &cli.report {
                write_report(RunReport::new(&summary).with_error(&source), path)?;
            }
            return Err(anyhow::Error::new(*source).context("Test run aborted"));
        }
        Err(e) => return Err(e).context("Test run aborted"),
    };

    ConsoleReporter::print(&render_summary(&summary));
    if let Some(path) = &cli.report {
        write_report(RunReport::new(&summary), path)?;
    }

    Ok(exit_code(&summary))
}

fn write_report(report: RunReport, path: &Path) -> Result<()> {
    report
        .write(path)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["cocotest", "-v", "-w", "-s", "--novalgrind", "a.c", "b.c"])
            .expect("parse failed");
        assert!(cli.verbose);
        assert!(cli.ignore_gcc_warnings);
        assert!(cli.stop);
        assert!(cli.novalgrind);
        assert_eq!(cli.testfiles, vec![PathBuf::from("a.c"), PathBuf::from("b.c")]);
    }

    #[test]
    fn test_requires_a_test_file() {
        assert!(Cli::try_parse_from(["cocotest", "-v"]).is_err());
    }
}
