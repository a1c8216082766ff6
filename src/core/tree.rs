// ZoneLens - core/tree.rs
//
// Tree utilities: pre-order flattening, delimiter-bounded path membership,
// ignore-set filtering, and path normalisation.
// Core layer: pure logic, no I/O.

use crate::core::model::TreeNode;
use crate::util::constants::PATH_SEPARATOR;
use std::collections::BTreeSet;

/// True if `path` equals `prefix` or is nested under it.
///
/// Nesting is delimiter-bounded: `a/b/c` is under `a/b`, `a/bc` is not.
pub fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}

/// All node paths of `tree` in pre-order, root included.
pub fn flatten_paths(tree: &TreeNode) -> Vec<&str> {
    let mut out = Vec::new();
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        out.push(node.path.as_str());
        // Reverse so the first child is visited next.
        stack.extend(node.children.iter().rev());
    }
    out
}

/// Number of nodes in `tree`, root included.
pub fn node_count(tree: &TreeNode) -> usize {
    1 + tree.children.iter().map(node_count).sum::<usize>()
}

/// Find the node with exactly `path`, if present.
pub fn find_node<'a>(tree: &'a TreeNode, path: &str) -> Option<&'a TreeNode> {
    if tree.path == path {
        return Some(tree);
    }
    if !tree.is_root() && !is_under(path, &tree.path) {
        return None;
    }
    tree.children.iter().find_map(|c| find_node(c, path))
}

/// True if `path` is an ignored entry or lies under one.
pub fn is_ignored(path: &str, ignored: &BTreeSet<String>) -> bool {
    ignored.iter().any(|ig| is_under(path, ig))
}

/// Remove every node covered by `ignored`, keeping the rest of the structure.
///
/// Returns `None` only when the root itself is covered, which requires the
/// empty path to be in the ignore-set. The input is never modified.
pub fn filter_ignored(tree: &TreeNode, ignored: &BTreeSet<String>) -> Option<TreeNode> {
    if ignored.is_empty() {
        return Some(tree.clone());
    }
    filter_node(tree, ignored)
}

fn filter_node(node: &TreeNode, ignored: &BTreeSet<String>) -> Option<TreeNode> {
    if is_ignored(&node.path, ignored) {
        return None;
    }
    Some(TreeNode {
        path: node.path.clone(),
        name: node.name.clone(),
        is_directory: node.is_directory,
        children: node
            .children
            .iter()
            .filter_map(|c| filter_node(c, ignored))
            .collect(),
    })
}

/// Normalise a user-supplied relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, `..` is resolved
/// lexically, and leading/trailing separators are removed. The project root
/// normalises to the empty string.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split(PATH_SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !unified.starts_with(PATH_SEPARATOR) {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::dir(
            "",
            ".",
            vec![
                TreeNode::dir(
                    "a",
                    "a",
                    vec![
                        TreeNode::dir("a/b", "b", vec![TreeNode::file("a/b/c", "c")]),
                        TreeNode::file("a/bc", "bc"),
                    ],
                ),
                TreeNode::dir("web", "web", vec![TreeNode::file("web/index.ts", "index.ts")]),
            ],
        )
    }

    #[test]
    fn test_is_under_is_delimiter_bounded() {
        assert!(is_under("a/b", "a/b"));
        assert!(is_under("a/b/c", "a/b"));
        assert!(!is_under("a/bc", "a/b"));
        assert!(!is_under("a", "a/b"));
    }

    #[test]
    fn test_flatten_is_pre_order_with_root() {
        let tree = sample_tree();
        assert_eq!(
            flatten_paths(&tree),
            vec!["", "a", "a/b", "a/b/c", "a/bc", "web", "web/index.ts"]
        );
        assert_eq!(node_count(&tree), 7);
    }

    #[test]
    fn test_find_node() {
        let tree = sample_tree();
        assert_eq!(find_node(&tree, "a/b/c").map(|n| n.name.as_str()), Some("c"));
        assert!(find_node(&tree, "a/b/d").is_none());
        assert!(find_node(&tree, "").is_some());
    }

    #[test]
    fn test_filter_removes_ignored_subtrees_only() {
        let tree = sample_tree();
        let ignored: BTreeSet<String> = ["a/b".to_string()].into_iter().collect();
        let filtered = filter_ignored(&tree, &ignored).unwrap();
        let paths = flatten_paths(&filtered);
        assert_eq!(paths, vec!["", "a", "a/bc", "web", "web/index.ts"]);
        // Input untouched.
        assert_eq!(node_count(&tree), 7);
    }

    #[test]
    fn test_filter_keeps_every_non_ignored_path() {
        let tree = sample_tree();
        let ignored: BTreeSet<String> = ["web".to_string(), "a/b/c".to_string()]
            .into_iter()
            .collect();
        let filtered = filter_ignored(&tree, &ignored).unwrap();
        let kept: BTreeSet<&str> = flatten_paths(&filtered).into_iter().collect();
        for path in flatten_paths(&tree) {
            assert_eq!(kept.contains(path), !is_ignored(path, &ignored), "{path}");
        }
        // Parent/child structure preserved.
        let b = find_node(&filtered, "a/b").unwrap();
        assert!(b.children.is_empty());
        assert!(b.is_directory);
    }

    #[test]
    fn test_filter_empty_set_is_identity() {
        let tree = sample_tree();
        assert_eq!(filter_ignored(&tree, &BTreeSet::new()), Some(tree));
    }

    #[test]
    fn test_filter_root_only_removed_when_explicitly_ignored() {
        let tree = sample_tree();
        let ignored: BTreeSet<String> = [String::new()].into_iter().collect();
        assert!(filter_ignored(&tree, &ignored).is_none());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/internal/mcp/"), "internal/mcp");
        assert_eq!(normalize_path("./web//src"), "web/src");
        assert_eq!(normalize_path("web\\src\\App.tsx"), "web/src/App.tsx");
        assert_eq!(normalize_path("a/b/../c"), "a/c");
        assert_eq!(normalize_path("/../a"), "a");
        assert_eq!(normalize_path("../a"), "../a");
        assert_eq!(normalize_path("."), "");
        assert_eq!(normalize_path(""), "");
    }
}
