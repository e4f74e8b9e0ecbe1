//! Child process execution.

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished child process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured stdout, byte for byte.
    pub stdout: Vec<u8>,

    /// Captured stderr, decoded for display.
    pub stderr: String,

    /// Exit code; -1 when the process was killed by a signal.
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Clean exit: status zero and nothing on stderr.
    pub fn is_clean(&self) -> bool {
        self.exit_code == 0 && self.stderr.is_empty()
    }
}

/// Run a program to completion and capture its output.
///
/// The caller is blocked until the process exits, or until `timeout`
/// elapses, in which case the child is killed.
pub async fn run_process<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
    timeout: Option<Duration>,
) -> HarnessResult<ExecutionResult> {
    let start = Instant::now();
    let name = program.to_string_lossy().into_owned();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| HarnessError::Spawn {
            program: name.clone(),
            source,
        })?;

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| HarnessError::Timeout {
                program: name.clone(),
                secs: limit.as_secs(),
            })??,
        None => child.wait_with_output().await?,
    };

    let result = ExecutionResult {
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        program = %name,
        exit_code = result.exit_code,
        duration_ms = result.duration_ms,
        "Process finished"
    );
    Ok(result)
}

/// Runs compiled test executables.
pub struct ExecutionRunner;

impl ExecutionRunner {
    /// Run the executable with no arguments.
    pub async fn execute(
        binary: &Path,
        timeout: Option<Duration>,
    ) -> HarnessResult<ExecutionResult> {
        run_process::<&str>(binary.as_os_str(), &[], timeout).await
    }
}
