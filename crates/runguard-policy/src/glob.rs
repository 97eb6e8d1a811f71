//! Glob patterns for write scopes and protected paths.
//!
//! Patterns compile to anchored regular expressions over `/`-separated
//! paths:
//!
//! | glob       | regex       | meaning                                      |
//! |------------|-------------|----------------------------------------------|
//! | `**/`      | `(?:.*/)?`  | zero or more whole segments (may be empty)   |
//! | `**`       | `.*`        | anything, including `/`                      |
//! | `*`        | `[^/]*`     | anything within one segment                  |
//! | `?`        | `[^/]`      | exactly one non-separator character          |
//!
//! Every other character is matched literally. `src/**` therefore matches
//! `src/a` and `src/a/b` but not `src` itself, while `a/**/b` matches `a/b`.

use regex::Regex;

use runguard_contracts::error::{GuardError, GuardResult};

/// Convert `\` separators to `/` and strip one leading `./`.
pub fn normalize_path(value: &str) -> String {
    let replaced = value.replace('\\', "/");
    match replaced.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => replaced,
    }
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    regex: Regex,
}

impl GlobMatcher {
    /// Compile `pattern`. The pattern is normalized the same way candidate
    /// paths are, so `./src/**` and `src\**` behave like `src/**`.
    ///
    /// Returns `GuardError::PolicyValidation` if the translated expression
    /// cannot be compiled (only possible for pathologically large patterns).
    pub fn new(pattern: &str) -> GuardResult<Self> {
        let source = glob_to_regex(&normalize_path(pattern));
        let regex = Regex::new(&source).map_err(|e| {
            GuardError::validation(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in the policy.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Return true if the whole (normalized) `candidate` matches.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(&normalize_path(candidate))
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                // Collapse runs of three or more stars into one `**`.
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
                if chars.get(i + 1) == Some(&'/') {
                    source.push_str("(?:.*/)?");
                    i += 2;
                } else {
                    source.push_str(".*");
                    i += 1;
                }
            }
            '*' => {
                source.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                source.push_str("[^/]");
                i += 1;
            }
            c => {
                let mut buf = [0u8; 4];
                source.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{glob_to_regex, normalize_path, GlobMatcher};

    fn matches(pattern: &str, path: &str) -> bool {
        GlobMatcher::new(pattern).unwrap().is_match(path)
    }

    #[test]
    fn double_star_suffix_requires_a_trailing_segment() {
        assert!(matches("src/**", "src/a"));
        assert!(matches("src/**", "src/a/b"));
        assert!(!matches("src/**", "src"));
        assert!(!matches("src/**", "srcfoo/a"));
    }

    #[test]
    fn double_star_slash_may_match_no_segments() {
        assert!(matches("a/**/b", "a/b"));
        assert!(matches("a/**/b", "a/x/b"));
        assert!(matches("a/**/b", "a/x/y/b"));
        assert!(!matches("a/**/b", "a/xb"));
        assert!(matches("**/*.rs", "lib.rs"));
        assert!(matches("**/*.rs", "crates/core/src/lib.rs"));
    }

    #[test]
    fn single_star_stays_within_one_segment() {
        assert!(matches("src/*.rs", "src/main.rs"));
        assert!(!matches("src/*.rs", "src/bin/main.rs"));
        assert!(matches("*", "README.md"));
        assert!(!matches("*", "docs/README.md"));
    }

    #[test]
    fn question_mark_matches_one_non_separator() {
        assert!(matches("file?.txt", "file1.txt"));
        assert!(!matches("file?.txt", "file.txt"));
        assert!(!matches("a?b", "a/b"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("docs/(draft)+.md", "docs/(draft)+.md"));
        assert!(!matches("docs/a.md", "docs/abmd"));
        assert!(matches("cost[$].txt", "cost[$].txt"));
    }

    #[test]
    fn pattern_is_anchored_at_both_ends() {
        assert!(!matches("infra/**", "src/infra/main.tf"));
        assert!(!matches("src/*.tf", "src/main.tf.bak"));
    }

    #[test]
    fn triple_star_collapses_to_double_star() {
        assert_eq!(glob_to_regex("a/***/b"), glob_to_regex("a/**/b"));
    }

    #[test]
    fn paths_and_patterns_are_normalized() {
        assert_eq!(normalize_path("./src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("src\\infra\\main.tf"), "src/infra/main.tf");
        assert_eq!(normalize_path("src/./lib.rs"), "src/./lib.rs");
        assert!(matches("src/**", ".\\src\\infra\\main.tf"));
        assert!(matches("./src/**", "src/a"));
    }

    proptest! {
        #[test]
        fn prefix_double_star_matches_every_nested_path(
            segments in prop::collection::vec("[a-z0-9_.-]{1,8}", 1..5)
        ) {
            let path = format!("src/{}", segments.join("/"));
            prop_assert!(matches("src/**", &path));
        }

        #[test]
        fn single_star_never_crosses_a_separator(
            a in "[a-z]{1,6}",
            b in "[a-z]{1,6}"
        ) {
            prop_assert!(matches("*", &a));
            let nested = format!("{}/{}", a, b);
            prop_assert!(!matches("*", &nested));
        }
    }
}
