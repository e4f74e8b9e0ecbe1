//! Project build description (Makefile) resolution.
//!
//! Only four keys are understood:
//!
//! - `CC=<name>` sets the compiler (defaults to `gcc`)
//! - `CFLAGS=<tokens>` appends compiler flags
//! - `SOURCES=<tokens>` appends project sources
//! - `LIBS=<tokens>` appends libraries
//!
//! Everything else is ignored. A trailing backslash continues a value on the
//! next physical line.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Compiler used when the build description does not name one.
pub const DEFAULT_COMPILER: &str = "gcc";

static TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s*,]").unwrap());

/// Split a value into tokens on whitespace, commas and asterisks.
///
/// Surrounding backslashes and whitespace are stripped first; empty tokens
/// are discarded.
pub fn split_tokens(value: &str) -> Vec<String> {
    let value = value.trim_matches(|c: char| c == '\\' || c.is_whitespace());
    TOKEN_SEPARATOR
        .split(value)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join backslash-continued physical lines into logical lines.
///
/// Every returned line is trimmed and blank lines are dropped.
pub fn join_continuations(text: &str) -> Vec<String> {
    let mut logical = Vec::new();
    let mut pending: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        let (body, continued) = match line.strip_suffix('\\') {
            Some(body) => (body.trim_end(), true),
            None => (line, false),
        };

        let joined = match pending.take() {
            Some(mut prefix) => {
                prefix.push(' ');
                prefix.push_str(body);
                prefix
            }
            None => body.to_string(),
        };

        if continued {
            pending = Some(joined);
        } else if !joined.is_empty() {
            logical.push(joined);
        }
    }

    if let Some(rest) = pending {
        if !rest.trim().is_empty() {
            logical.push(rest);
        }
    }

    logical
}

/// A recognized build description assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MakeKey {
    Cc,
    Cflags,
    Sources,
    Libs,
}

impl MakeKey {
    const ALL: [(MakeKey, &'static str); 4] = [
        (MakeKey::Cc, "CC="),
        (MakeKey::Cflags, "CFLAGS="),
        (MakeKey::Sources, "SOURCES="),
        (MakeKey::Libs, "LIBS="),
    ];

    /// Classify a logical line, returning the key and its value.
    fn classify(line: &str) -> Option<(MakeKey, &str)> {
        Self::ALL
            .iter()
            .find_map(|(key, prefix)| line.strip_prefix(prefix).map(|value| (*key, value)))
    }
}

/// Base compiler configuration shared by every test of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Compiler executable.
    pub compiler: String,

    /// Project default flags, in Makefile order.
    pub flags: Vec<String>,

    /// Default sources: the mock source first, then the project sources.
    pub sources: Vec<PathBuf>,

    /// Libraries, in Makefile order.
    pub libs: Vec<String>,
}

impl BuildConfig {
    /// Parse a build description held in memory.
    pub fn parse(text: &str, config: &HarnessConfig) -> Self {
        let mut build = Self {
            compiler: DEFAULT_COMPILER.to_string(),
            flags: Vec::new(),
            sources: vec![PathBuf::from(&config.mock_source)],
            libs: Vec::new(),
        };

        for line in join_continuations(text) {
            let Some((key, value)) = MakeKey::classify(&line) else {
                continue;
            };
            match key {
                MakeKey::Cc => build.compiler = value.trim().to_string(),
                MakeKey::Cflags => build.flags.extend(
                    split_tokens(value)
                        .into_iter()
                        .filter(|flag| *flag != config.filtered_flag),
                ),
                MakeKey::Sources => build.sources.extend(project_sources(value, config)),
                MakeKey::Libs => build.libs.extend(split_tokens(value)),
            }
        }

        build
    }

    /// Read and parse the build description named by `config`.
    pub fn load(config: &HarnessConfig) -> HarnessResult<Self> {
        let path = &config.build_description;
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Config {
            path: path.clone(),
            source,
        })?;
        let build = Self::parse(&text, config);
        debug!(
            path = %path.display(),
            compiler = %build.compiler,
            flags = build.flags.len(),
            sources = build.sources.len(),
            libs = build.libs.len(),
            "Resolved build description"
        );
        Ok(build)
    }
}

/// Tokenize a source list, dropping the real entry point and rebasing the
/// rest onto the project root.
pub fn project_sources(value: &str, config: &HarnessConfig) -> Vec<PathBuf> {
    split_tokens(value)
        .into_iter()
        .filter(|source| *source != config.entry_point)
        .map(|source| PathBuf::from(format!("{}{}", config.project_root, source)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAKEFILE: &str = "\
CC=clang
CFLAGS=-std=gnu99 -Wall -O2 \\
    -DAVX2 -march=native
LIBS=-lm
SOURCES=main.c cgp_core.c,ga.c \\
    fitness.c
";

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens(" -a,-b  -c \\"), vec!["-a", "-b", "-c"]);
        assert_eq!(split_tokens("x*y"), vec!["x", "y"]);
        assert!(split_tokens("  \\ ").is_empty());
    }

    #[test]
    fn test_join_continuations() {
        let lines = join_continuations("A=1 \\\n  2 \\\n 3\n\nB=4\n");
        assert_eq!(lines, vec!["A=1 2 3", "B=4"]);
    }

    #[test]
    fn test_join_continuation_at_eof() {
        let lines = join_continuations("A=1 \\\n");
        assert_eq!(lines, vec!["A=1"]);
    }

    #[test]
    fn test_parse_makefile() {
        let build = BuildConfig::parse(MAKEFILE, &HarnessConfig::default());
        assert_eq!(build.compiler, "clang");
        assert_eq!(build.flags, vec!["-std=gnu99", "-Wall", "-O2", "-march=native"]);
        assert_eq!(build.libs, vec!["-lm"]);
        assert_eq!(
            build.sources,
            vec![
                PathBuf::from("./testbench_mock.c"),
                PathBuf::from("../cgp_core.c"),
                PathBuf::from("../ga.c"),
                PathBuf::from("../fitness.c"),
            ]
        );
    }

    #[test]
    fn test_defaults_when_keys_absent() {
        let build = BuildConfig::parse("# nothing here\nOTHER=1\n", &HarnessConfig::default());
        assert_eq!(build.compiler, DEFAULT_COMPILER);
        assert!(build.flags.is_empty());
        assert!(build.libs.is_empty());
        assert_eq!(build.sources, vec![PathBuf::from("./testbench_mock.c")]);
    }

    #[test]
    fn test_repeated_keys_append() {
        let build = BuildConfig::parse("CFLAGS=-a\nCFLAGS=-b\n", &HarnessConfig::default());
        assert_eq!(build.flags, vec!["-a", "-b"]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let config = HarnessConfig::default();
        assert_eq!(BuildConfig::parse(MAKEFILE, &config), BuildConfig::parse(MAKEFILE, &config));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let config = HarnessConfig::default().with_build_description("/nonexistent/Makefile");
        let err = BuildConfig::load(&config).unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }));
    }

    #[test]
    fn test_load_from_disk_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Makefile");
        std::fs::write(&path, MAKEFILE).unwrap();
        let config = HarnessConfig::default().with_build_description(&path);

        let first = BuildConfig::load(&config).unwrap();
        let second = BuildConfig::load(&config).unwrap();
        assert_eq!(first, second);
    }
}
