//! PatternMatcher: glob-like allow rules and exact deny rules
//!
//! Allow rules are written the way blog admins type them into a settings
//! form (`/archives/*`, `*posts*`, `'/post/*'`) and are tested against the
//! URL path only. Deny rules are exact URLs or paths.
//!
//! Normalization is idempotent: quotes and every leading/trailing `*` are
//! stripped and a leading `/` is ensured, so `compile(normalize(p))` and
//! `compile(p)` produce equal rules.

pub mod gate;

pub use gate::{gate, DenyMatch, HideReason, Visibility};

use crate::error::PatternError;
use regex::Regex;

// =============================================================================
// PatternRule
// =============================================================================

/// A single compiled allow rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    normalized: String,
    regex: Option<Regex>,
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PatternRule {}

/// Strip quotes and outer wildcards, then ensure a leading `/`
pub fn normalize(pattern: &str) -> String {
    let unquoted: String = pattern.chars().filter(|c| *c != '\'' && *c != '"').collect();
    let core = unquoted.trim().trim_matches('*');
    if core.starts_with('/') {
        core.to_string()
    } else {
        format!("/{}", core)
    }
}

/// Turn a normalized pattern into a regex source: literal text escaped,
/// interior `*` widened to `.*`
fn to_regex_source(normalized: &str) -> String {
    normalized
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

/// Compile a pattern, surfacing the (unlikely) compile failure
pub fn try_compile(pattern: &str) -> Result<PatternRule, PatternError> {
    let normalized = normalize(pattern);
    let regex = Regex::new(&to_regex_source(&normalized)).map_err(|e| PatternError::Compile {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PatternRule {
        normalized,
        regex: Some(regex),
    })
}

/// Compile a pattern. A rule that fails to compile never matches.
pub fn compile(pattern: &str) -> PatternRule {
    try_compile(pattern).unwrap_or_else(|err| {
        log::warn!("{}; rule disabled", err);
        PatternRule {
            normalized: normalize(pattern),
            regex: None,
        }
    })
}

impl PatternRule {
    /// Search (not full-match) the path for this rule
    pub fn matches(&self, path: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(path))
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

// =============================================================================
// PatternList
// =============================================================================

/// OR-combination of allow rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternList {
    rules: Vec<PatternRule>,
}

impl PatternList {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            rules: patterns.iter().map(|p| compile(p.as_ref())).collect(),
        }
    }

    /// True if any rule matches. An empty list matches nothing.
    pub fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_wildcard_is_prefix_match() {
        let rule = compile("/post/*");
        assert!(rule.matches("/post/hello"));
        assert!(rule.matches("/post/"));
        assert!(!rule.matches("/about"));
    }

    #[test]
    fn test_leading_and_trailing_wildcards_match_substring() {
        let rule = compile("*archives*");
        assert_eq!(rule.normalized(), "/archives");
        assert!(rule.matches("/archives/2024/rust"));
        assert!(rule.matches("/blog/archives/x"));
        assert!(!rule.matches("/posts/x"));
    }

    #[test]
    fn test_quotes_are_stripped() {
        let rule = compile("'/post/*'");
        assert_eq!(rule, compile("/post/"));
        assert!(rule.matches("/post/hello"));

        let rule = compile("\"docs\"");
        assert!(rule.matches("/docs/intro"));
    }

    #[test]
    fn test_missing_slash_is_prepended() {
        let rule = compile("archives/*");
        assert_eq!(rule.normalized(), "/archives/");
        assert!(rule.matches("/archives/first"));
    }

    #[test]
    fn test_interior_wildcard_spans_segments() {
        let rule = compile("/post/*/comments");
        assert!(rule.matches("/post/hello/comments"));
        assert!(rule.matches("/post/a/b/comments"));
        assert!(!rule.matches("/post/hello"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let rule = compile("/c++/(draft)?");
        assert!(rule.matches("/c++/(draft)?/x"));
        assert!(!rule.matches("/cc/draft"));

        let dot = compile("/a.b");
        assert!(dot.matches("/a.b"));
        assert!(!dot.matches("/axb"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for p in ["*foo*", "**foo**", "'/post/*'", "archives/*", "/a/*/b*", "*", ""] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once, "normalize({:?}) not idempotent", p);
            assert_eq!(compile(&once), compile(p), "compile(normalize({:?})) != compile", p);
        }
    }

    #[test]
    fn test_bare_star_matches_everything() {
        let rule = compile("*");
        assert!(rule.matches("/"));
        assert!(rule.matches("/anything/at/all"));
    }

    #[test]
    fn test_list_is_logical_or() {
        let list = PatternList::compile(&["/post/*", "/notes/*"]);
        assert!(list.matches("/post/a"));
        assert!(list.matches("/notes/b"));
        assert!(!list.matches("/about"));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = PatternList::compile::<&str>(&[]);
        assert!(list.is_empty());
        assert!(!list.matches("/post/a"));
    }

    #[test]
    fn test_stripped_literal_matches_any_containing_path() {
        let literals = ["post", "2024/rust", "a-b_c"];
        for lit in literals {
            let rule = compile(&format!("*{}*", lit));
            for path in [format!("/{}", lit), format!("/x/{}/y", lit), format!("/{}z", lit)] {
                assert!(rule.matches(&path), "{} should match {}", lit, path);
            }
        }
    }
}
