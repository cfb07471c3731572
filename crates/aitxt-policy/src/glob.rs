//! Glob matching for training path rules.
//!
//! Patterns come from remote documents, so compilation is bounded: patterns
//! and paths over their length ceilings never match, and any failure to
//! build the regex is reported as "no match" by [`match_glob`].
//!
//! Grammar:
//! - `*` matches within a single path segment (never `/`)
//! - `**` matches anything, including `/` and the empty string
//! - `/**/` matches a single `/` or any run of intermediate segments
//! - a trailing `/**` after a non-empty prefix also matches the bare prefix
//!   (`/blog/**` matches `/blog`); `/**` on its own still requires the `/`
//! - every other character is literal

use aitxt::limits::{MAX_PATH_LENGTH, MAX_PATTERN_LENGTH};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Upper bound on the compiled program size of one pattern
const MAX_COMPILED_SIZE: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("pattern of {0} characters exceeds the limit of {max}", max = MAX_PATTERN_LENGTH)]
    TooLong(usize),
    #[error("pattern could not be compiled: {0}")]
    Compile(#[from] regex::Error),
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    original: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a pattern for repeated matching
    pub fn compile(pattern: &str) -> Result<Self, GlobError> {
        let len = pattern.chars().count();
        if len > MAX_PATTERN_LENGTH {
            return Err(GlobError::TooLong(len));
        }

        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .size_limit(MAX_COMPILED_SIZE)
            .build()?;

        Ok(Self {
            original: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Test a path; paths over the length ceiling never match
    pub fn matches(&self, path: &str) -> bool {
        path.chars().count() <= MAX_PATH_LENGTH && self.regex.is_match(path)
    }
}

/// Test `path` against `pattern`, treating any failure as no match
pub fn match_glob(path: &str, pattern: &str) -> bool {
    match GlobPattern::compile(pattern) {
        Ok(glob) => glob.matches(path),
        Err(_) => false,
    }
}

/// Translate a glob into an anchored regex
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex_str = String::with_capacity(pattern.len() * 2 + 2);
    regex_str.push('^');

    let mut i = 0;
    while i < chars.len() {
        let rest = &chars[i..];
        match rest {
            ['/', '*', '*', '/', ..] => {
                regex_str.push_str("(?:/|/.*/)");
                i += 4;
            }
            ['/', '*', '*'] if i > 0 => {
                regex_str.push_str("(?:/.*)?");
                i += 3;
            }
            ['*', '*', ..] => {
                regex_str.push_str(".*");
                i += 2;
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
            }
            ['*', ..] => {
                regex_str.push_str("[^/]*");
                i += 1;
            }
            [c, ..] => {
                let mut buf = [0u8; 4];
                regex_str.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
            [] => break,
        }
    }

    regex_str.push('$');
    regex_str
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(match_glob("/blog/post-1", "/blog/*"));
        assert!(!match_glob("/blog/2024/post", "/blog/*"));
        assert!(match_glob("/img/cat.png", "/img/*.png"));
        assert!(!match_glob("/img/a/cat.png", "/img/*.png"));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        assert!(match_glob("/blog/2024/post", "/blog/**"));
        assert!(match_glob("/blog/", "/blog/**"));
        assert!(match_glob("/blog", "/blog/**"));
        assert!(!match_glob("/blogroll", "/blog/**"));
        assert!(match_glob("/anything/at/all", "**"));
        assert!(match_glob("/a/b.txt", "/a/**.txt"));
    }

    #[test]
    fn test_double_star_segment() {
        assert!(match_glob("/a/e", "/a/**/e"));
        assert!(match_glob("/a/x/e", "/a/**/e"));
        assert!(match_glob("/a/x/y/e", "/a/**/e"));
        assert!(!match_glob("/a/xe", "/a/**/e"));
        assert!(match_glob("/drafts/x", "/**/drafts/**"));
        assert!(match_glob("/news/2024/drafts", "/**/drafts/**"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert!(match_glob("/a.b", "/a.b"));
        assert!(!match_glob("/aXb", "/a.b"));
        assert!(match_glob("/q?x=(1)", "/q?x=(1)"));
        assert!(!match_glob("/q", "/q?"));
        assert!(match_glob("/[draft]/$1^", "/[draft]/$1^"));
        assert!(match_glob("/café/ü", "/café/*"));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(match_glob("", ""));
        assert!(!match_glob("/", ""));
        assert!(!match_glob("", "/a"));
        assert!(match_glob("", "**"));
    }

    #[test]
    fn test_root_double_star_needs_slash() {
        assert!(!match_glob("", "/**"));
        assert!(match_glob("/", "/**"));
        assert!(match_glob("/x/y", "/**"));
        assert!(!match_glob("x", "/**"));
    }

    #[test]
    fn test_length_ceilings() {
        let long_pattern = "a".repeat(1001);
        assert!(!match_glob(&long_pattern, &long_pattern));
        assert!(matches!(
            GlobPattern::compile(&long_pattern),
            Err(GlobError::TooLong(1001))
        ));

        let ok_pattern = "a".repeat(1000);
        assert!(match_glob(&ok_pattern, &ok_pattern));

        let long_path = format!("/{}", "x".repeat(2000));
        assert!(!match_glob(&long_path, "/**"));
        assert!(match_glob(&long_path[..2000], "/**"));
    }

    #[test]
    fn test_pathological_pattern_is_bounded() {
        let pattern = "*".repeat(999) + "b";
        let path = "a".repeat(1999);
        assert!(!match_glob(&path, &pattern));
    }

    #[test]
    fn test_compiled_reuse() {
        let glob = GlobPattern::compile("/docs/**").unwrap();
        assert_eq!(glob.as_str(), "/docs/**");
        assert!(glob.matches("/docs/a/b"));
        assert!(!glob.matches("/doc"));
    }
}
