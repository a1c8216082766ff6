// ZoneLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Tree
// =============================================================================

/// One node of a project's file tree.
///
/// `path` is `/`-separated and relative to the project root; the root itself
/// has the empty path. Every descendant's path is its parent's path plus `/`
/// plus one segment (the root's children have no leading `/`). Children keep
/// display order, which is not guaranteed to be sorted.
///
/// Trees are rebuilt on every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub path: String,
    pub name: String,
    #[serde(rename = "is_dir")]
    pub is_directory: bool,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A file (leaf) node.
    pub fn file(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory: false,
            children: Vec::new(),
        }
    }

    /// A directory node with the given children.
    pub fn dir(path: impl Into<String>, name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory: true,
            children,
        }
    }

    /// True for the project root (empty path).
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

// =============================================================================
// Zones, projects, agents
// =============================================================================

/// A named region of a project's tree.
///
/// Membership is the union of `explicit_paths` and whatever `pattern` matches.
/// An empty pattern means the zone is defined by its explicit paths alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub pattern: String,
    pub purpose: String,
    pub constraints: Vec<String>,
    /// Empty when no agent is assigned.
    pub assigned_agent_id: String,
    pub explicit_paths: BTreeSet<String>,
}

impl Zone {
    /// True if the zone carries a non-blank pattern.
    pub fn has_pattern(&self) -> bool {
        !self.pattern.trim().is_empty()
    }
}

/// Editable fields of a zone, used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneDraft {
    pub project_id: String,
    pub name: String,
    pub pattern: String,
    pub purpose: String,
    pub constraints: Vec<String>,
    pub assigned_agent_id: String,
}

/// A project: the directory root that trees, matches, and zones refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub root_dir: String,
    /// Paths hidden from the displayed tree (with their descendants).
    /// They still take part in zone resolution.
    pub ignored_paths: BTreeSet<String>,
}

/// Agent metadata that zones may reference by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

// =============================================================================
// Derived highlight state
// =============================================================================

/// A zone whose pattern could not be evaluated during a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedZone {
    pub zone: String,
    pub reason: String,
}

/// Result of resolving a zone set against a tree.
///
/// Never persisted, and always replaced wholesale by the next resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneHighlights {
    /// Every path claimed by at least one zone.
    pub highlight_paths: BTreeSet<String>,

    /// Path to the names of the zones claiming it, in zone list order.
    pub path_to_zones: BTreeMap<String, Vec<String>>,

    /// Zones whose pattern evaluation failed this pass. They still contribute
    /// their explicit paths.
    pub skipped: Vec<SkippedZone>,
}

impl ZoneHighlights {
    /// True if `path` belongs to any zone.
    pub fn is_highlighted(&self, path: &str) -> bool {
        self.highlight_paths.contains(path)
    }

    /// Names of the zones claiming `path` (empty if none).
    pub fn zones_for(&self, path: &str) -> &[String] {
        self.path_to_zones
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_node_decodes_wire_shape() {
        let json = r#"{"path":"","name":".","is_dir":true,"children":[
            {"path":"cmd","name":"cmd","is_dir":true},
            {"path":"go.mod","name":"go.mod","is_dir":false,"children":[]}
        ]}"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert!(tree.is_root());
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].is_directory);
        assert!(tree.children[0].children.is_empty());
        assert!(!tree.children[1].is_directory);
    }

    #[test]
    fn test_zone_blank_pattern_is_not_a_pattern() {
        let zone = Zone {
            pattern: "   ".to_string(),
            ..Default::default()
        };
        assert!(!zone.has_pattern());
    }

    #[test]
    fn test_zones_for_unknown_path_is_empty() {
        let highlights = ZoneHighlights::default();
        assert!(highlights.zones_for("src").is_empty());
        assert!(!highlights.is_highlighted("src"));
    }
}
