//! Resolved per-test build plan.

use crate::build_config::BuildConfig;
use crate::directive::TestDirectives;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Fully merged compiler and run instructions for one test.
///
/// `flags`, `sources` and `libs` keep the order in which the layers were
/// merged: project defaults first, then the test's own additions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub compiler: String,
    pub flags: Vec<String>,
    pub sources: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub test_file: PathBuf,
    pub standalone: bool,
}

impl ResolvedPlan {
    /// Merge the project configuration with a test's directives.
    pub fn merge(build: &BuildConfig, directives: &TestDirectives, test_file: &Path) -> Self {
        let flags = build
            .flags
            .iter()
            .chain(directives.extra_flags.iter())
            .cloned()
            .collect();
        let sources = directives
            .source_override
            .clone()
            .unwrap_or_else(|| build.sources.clone());

        Self {
            compiler: build.compiler.clone(),
            flags,
            sources,
            libs: build.libs.clone(),
            test_file: test_file.to_path_buf(),
            standalone: directives.standalone,
        }
    }

    /// Compiler arguments producing `output`.
    ///
    /// Order: flags, sources, the test file, `-o output`, then libraries so
    /// the linker sees them after every object that needs them.
    pub fn compiler_args(&self, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(
            self.flags.len() + self.sources.len() + self.libs.len() + 3,
        );
        args.extend(self.flags.iter().map(OsString::from));
        args.extend(self.sources.iter().map(OsString::from));
        args.push(self.test_file.clone().into_os_string());
        args.push(OsString::from("-o"));
        args.push(output.as_os_str().to_os_string());
        args.extend(self.libs.iter().map(OsString::from));
        args
    }

    /// Human-readable command line, as echoed in verbose mode.
    pub fn command_line(&self, output: &Path) -> String {
        let args = self
            .compiler_args(output)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{} {}", self.compiler, args)
    }

    /// Deterministic SHA-256 digest of the plan, independent of the output
    /// path.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.compiler.as_bytes());
        hasher.update(b"\0");
        for arg in self.compiler_args(Path::new("")) {
            hasher.update(arg.to_string_lossy().as_bytes());
            hasher.update(b"\0");
        }
        hasher.update([u8::from(self.standalone)]);
        hex::encode(hasher.finalize())
    }
}
