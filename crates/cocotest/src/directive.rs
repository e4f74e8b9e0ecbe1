//! Per-test directives from the leading `/** ... */` comment.
//!
//! ```c
//! /**
//!  * Tests CGP evaluation.
//!  * Compile with -DTEST_EVAL
//!  * Source files cgp_core.c cgp_dump.c ga.c
//!  */
//! ```

use crate::build_config::{project_sources, split_tokens};
use crate::config::HarnessConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marker of a line carrying extra compiler flags.
pub const COMPILE_WITH: &str = "Compile with";

/// Marker of a line replacing the default source list.
pub const SOURCE_FILES: &str = "Source files";

/// Marker of a test verified only by process health.
pub const STANDALONE: &str = "\"Stand-alone\" test executable";

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\A\s*/\*\*(.+?)\*/").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\*").unwrap());

/// One classified header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `Compile with ...`
    Flags(Vec<String>),
    /// `Source files ...`, already rebased onto the project root.
    Sources(Vec<PathBuf>),
    /// `"Stand-alone" test executable ...`
    Standalone,
    /// Anything else.
    Description(String),
}

impl Directive {
    /// Classify a single trimmed header line.
    pub fn classify(line: &str, config: &HarnessConfig) -> Self {
        if let Some(rest) = line.strip_prefix(COMPILE_WITH) {
            Directive::Flags(split_tokens(rest))
        } else if let Some(rest) = line.strip_prefix(SOURCE_FILES) {
            Directive::Sources(project_sources(rest, config))
        } else if line.starts_with(STANDALONE) {
            Directive::Standalone
        } else {
            Directive::Description(line.to_string())
        }
    }
}

/// Overrides a test declares for itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestDirectives {
    /// Flags appended after the project defaults.
    pub extra_flags: Vec<String>,

    /// Replacement for the default source list (mock source not included).
    pub source_override: Option<Vec<PathBuf>>,

    /// Skip output comparison; pass on clean exit.
    pub standalone: bool,

    /// Free-text description lines.
    pub description: Vec<String>,
}

impl TestDirectives {
    /// Fold one directive into the set, in header order.
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Flags(flags) => self.extra_flags.extend(flags),
            Directive::Sources(sources) => self
                .source_override
                .get_or_insert_with(Vec::new)
                .extend(sources),
            Directive::Standalone => self.standalone = true,
            Directive::Description(line) => self.description.push(line),
        }
    }

    /// Parse the header of a test source.
    ///
    /// Returns `None` when the content does not start with a `/** ... */`
    /// comment.
    pub fn parse(content: &str, config: &HarnessConfig) -> Option<Self> {
        let body = HEADER.captures(content)?.get(1)?.as_str();

        let mut directives = Self::default();
        for line in LINE_BREAK.split(body).map(str::trim) {
            if line.is_empty() {
                continue;
            }
            directives.apply(Directive::classify(line, config));
        }
        Some(directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<TestDirectives> {
        TestDirectives::parse(content, &HarnessConfig::default())
    }

    #[test]
    fn test_compile_with_flags() {
        let d = parse("/**\n * Compile with -DX -DY\n */\nint main(){}").unwrap();
        assert_eq!(d.extra_flags, vec!["-DX", "-DY"]);
        assert!(d.source_override.is_none());
        assert!(!d.standalone);
        assert!(d.description.is_empty());
    }

    #[test]
    fn test_full_header() {
        let content = "\
/**
 * Tests CGP evaluation = calculation of the outputs.
 * Compile with -DTEST_EVAL_AVX -DAVX2
 * Source files cgp_core.c cgp_dump.c, main.c cgp_avx.c
 */

#include <stdio.h>
";
        let d = parse(content).unwrap();
        assert_eq!(d.extra_flags, vec!["-DTEST_EVAL_AVX", "-DAVX2"]);
        assert_eq!(
            d.source_override,
            Some(vec![
                PathBuf::from("../cgp_core.c"),
                PathBuf::from("../cgp_dump.c"),
                PathBuf::from("../cgp_avx.c"),
            ])
        );
        assert_eq!(
            d.description,
            vec!["Tests CGP evaluation = calculation of the outputs."]
        );
    }

    #[test]
    fn test_standalone_marker() {
        let content = "/**\n * Tests PSNR.\n * \"Stand-alone\" test executable - no expected output provided.\n */\n";
        let d = parse(content).unwrap();
        assert!(d.standalone);
        assert_eq!(d.description, vec!["Tests PSNR."]);
    }

    #[test]
    fn test_leading_whitespace_and_case() {
        let d = parse("\n\n   /**\n * Compile with -DZ\n */").unwrap();
        assert_eq!(d.extra_flags, vec!["-DZ"]);
    }

    #[test]
    fn test_single_line_header() {
        let d = parse("/** Compile with -DONE */").unwrap();
        assert_eq!(d.extra_flags, vec!["-DONE"]);
    }

    #[test]
    fn test_missing_header() {
        assert!(parse("#include <stdio.h>\n/** late */").is_none());
        assert!(parse("/* plain comment */").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_repeated_directives_append() {
        let content = "/**\n * Compile with -DA\n * Compile with -DB\n * Source files a.c\n * Source files b.c\n */";
        let d = parse(content).unwrap();
        assert_eq!(d.extra_flags, vec!["-DA", "-DB"]);
        assert_eq!(
            d.source_override,
            Some(vec![PathBuf::from("../a.c"), PathBuf::from("../b.c")])
        );
    }

    #[test]
    fn test_classify() {
        let config = HarnessConfig::default();
        assert_eq!(
            Directive::classify("Compile with -DA,-DB", &config),
            Directive::Flags(vec!["-DA".to_string(), "-DB".to_string()])
        );
        assert_eq!(
            Directive::classify("\"Stand-alone\" test executable", &config),
            Directive::Standalone
        );
        assert_eq!(
            Directive::classify("compile with lowercase", &config),
            Directive::Description("compile with lowercase".to_string())
        );
    }
}
