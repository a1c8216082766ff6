// ZoneLens - core/pattern.rs
//
// Pattern evaluator: turns a regex-like pattern string into the list of
// matching relative paths, or a failure classified as either a malformed
// pattern or a transport problem.
//
// Matching is search semantics (the regex may match anywhere in the path),
// delegated to the `regex` crate. This module decides which paths are tested
// and how failures are bucketed.

use crate::core::model::TreeNode;
use crate::core::tree::flatten_paths;
use crate::util::error::EvalError;
use regex::Regex;

/// Source of matching paths for a pattern.
///
/// Implementations receive a non-blank pattern that already compiled
/// locally; they may still reject it (a backend with a different regex
/// dialect), which must surface as `EvalError::Pattern`.
pub trait PatternMatcher {
    fn matching_paths(&self, pattern: &str) -> Result<Vec<String>, EvalError>;
}

impl<F> PatternMatcher for F
where
    F: Fn(&str) -> Result<Vec<String>, EvalError>,
{
    fn matching_paths(&self, pattern: &str) -> Result<Vec<String>, EvalError> {
        self(pattern)
    }
}

/// Compile `pattern`, mapping a syntax error to `EvalError::Pattern`.
pub fn compile_pattern(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|e| EvalError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Evaluate `pattern` through `matcher`.
///
/// A blank pattern is the idle state: it yields no paths and no failure
/// without consulting the matcher. Malformed patterns are rejected before
/// the matcher is called.
pub fn evaluate(pattern: &str, matcher: &dyn PatternMatcher) -> Result<Vec<String>, EvalError> {
    if pattern.trim().is_empty() {
        return Ok(Vec::new());
    }
    compile_pattern(pattern)?;
    matcher.matching_paths(pattern)
}

/// Paths of `candidates` that `regex` matches, in input order.
pub fn match_paths<'a, I>(regex: &Regex, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|p| regex.is_match(p))
        .map(str::to_string)
        .collect()
}

/// Evaluates patterns locally against an in-memory tree.
///
/// Every node is a candidate, the root (empty path) included, in pre-order.
pub struct TreeMatcher<'a> {
    paths: Vec<&'a str>,
}

impl<'a> TreeMatcher<'a> {
    pub fn new(tree: &'a TreeNode) -> Self {
        Self {
            paths: flatten_paths(tree),
        }
    }
}

impl PatternMatcher for TreeMatcher<'_> {
    fn matching_paths(&self, pattern: &str) -> Result<Vec<String>, EvalError> {
        let regex = compile_pattern(pattern)?;
        Ok(match_paths(&regex, self.paths.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn tree() -> TreeNode {
        TreeNode::dir(
            "",
            ".",
            vec![
                TreeNode::dir(
                    "cmd",
                    "cmd",
                    vec![TreeNode::dir("cmd/server", "server", vec![])],
                ),
                TreeNode::dir(
                    "internal",
                    "internal",
                    vec![TreeNode::file("internal/mcp.go", "mcp.go")],
                ),
            ],
        )
    }

    #[test]
    fn test_blank_pattern_is_idle() {
        let called = Cell::new(false);
        let matcher = |_: &str| -> Result<Vec<String>, EvalError> {
            called.set(true);
            Ok(vec!["x".to_string()])
        };
        assert_eq!(evaluate("", &matcher), Ok(Vec::new()));
        assert_eq!(evaluate("  \t", &matcher), Ok(Vec::new()));
        assert!(!called.get());
    }

    #[test]
    fn test_unterminated_class_is_pattern_error() {
        let tree = tree();
        let err = evaluate("[abc", &TreeMatcher::new(&tree)).unwrap_err();
        assert!(err.is_pattern(), "got {err:?}");
    }

    #[test]
    fn test_malformed_pattern_never_reaches_matcher() {
        let called = Cell::new(false);
        let matcher = |_: &str| -> Result<Vec<String>, EvalError> {
            called.set(true);
            Ok(Vec::new())
        };
        assert!(evaluate("(unclosed", &matcher).is_err());
        assert!(!called.get());
    }

    #[test]
    fn test_network_failure_on_valid_pattern_is_transport() {
        let matcher = |_: &str| -> Result<Vec<String>, EvalError> {
            Err(EvalError::from_message("cmd", "connection reset by peer"))
        };
        let err = evaluate("cmd", &matcher).unwrap_err();
        assert!(!err.is_pattern());
    }

    #[test]
    fn test_search_semantics_not_anchored() {
        let tree = tree();
        let paths = evaluate("mcp", &TreeMatcher::new(&tree)).unwrap();
        assert_eq!(paths, vec!["internal/mcp.go"]);

        let paths = evaluate("^cmd", &TreeMatcher::new(&tree)).unwrap();
        assert_eq!(paths, vec!["cmd", "cmd/server"]);
    }

    #[test]
    fn test_match_all_includes_root() {
        let tree = tree();
        let paths = evaluate(".*", &TreeMatcher::new(&tree)).unwrap();
        assert_eq!(paths.first().map(String::as_str), Some(""));
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn test_surrounding_whitespace_is_part_of_pattern() {
        let tree = tree();
        let paths = evaluate(" server", &TreeMatcher::new(&tree)).unwrap();
        assert!(paths.is_empty());
    }
}
