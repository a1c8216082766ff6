// ZoneLens - platform/fs.rs
//
// Local filesystem backend. Trees and pattern matches come from walking the
// project's root directory; projects, zones, and agents live in the shared
// in-memory catalog.
//
// Per-entry walk errors (permission denied on a subdirectory, a file vanishing
// mid-walk) are non-fatal and skipped. Only an unreadable root fails the call.
//
// The most recent walk is kept for TREE_REUSE_MS so one load (tree fetch plus
// a pattern match per zone) touches the disk once. `fetch_tree` always walks.

use crate::core::model::{Agent, Project, TreeNode, Zone, ZoneDraft};
use crate::core::pattern::match_paths;
use crate::core::provider::BlueprintProvider;
use crate::core::tree::flatten_paths;
use crate::platform::memory::Catalog;
use crate::util::constants::{MAX_TREE_DEPTH, ROOT_NODE_NAME, TREE_REUSE_MS};
use crate::util::error::ProviderError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

struct RecentWalk {
    root: PathBuf,
    finished: Instant,
    tree: TreeNode,
}

/// Backend reading trees from the local filesystem.
pub struct LocalProvider {
    catalog: Catalog,
    recent: Mutex<Option<RecentWalk>>,
    walks: AtomicUsize,
}

impl LocalProvider {
    /// Local backend whose default project is rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            catalog: Catalog::with_default_project(&root.to_string_lossy()),
            recent: Mutex::new(None),
            walks: AtomicUsize::new(0),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of directory walks performed so far.
    pub fn walk_count(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }

    fn project_root(&self, project_id: &str) -> Result<PathBuf, ProviderError> {
        let project = self.catalog.project(project_id)?;
        Ok(PathBuf::from(project.root_dir))
    }

    fn recent(&self) -> MutexGuard<'_, Option<RecentWalk>> {
        // Only ever replaced whole; poisoned data is intact.
        self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Walk `root` and remember the result.
    fn walk(&self, root: &Path) -> Result<TreeNode, ProviderError> {
        let tree = build_tree(root)?;
        self.walks.fetch_add(1, Ordering::Relaxed);
        *self.recent() = Some(RecentWalk {
            root: root.to_path_buf(),
            finished: Instant::now(),
            tree: tree.clone(),
        });
        Ok(tree)
    }

    /// The remembered tree for `root` if it is still fresh, else a new walk.
    fn recent_or_walk(&self, root: &Path) -> Result<TreeNode, ProviderError> {
        let reuse = Duration::from_millis(TREE_REUSE_MS);
        if let Some(recent) = self.recent().as_ref() {
            if recent.root == root && recent.finished.elapsed() <= reuse {
                return Ok(recent.tree.clone());
            }
        }
        self.walk(root)
    }
}

/// Build the tree rooted at `root`.
///
/// Children list directories first, then entries by file name.
pub fn build_tree(root: &Path) -> Result<TreeNode, ProviderError> {
    check_root(root)?;

    // stack[d] is the open node at depth d.
    let mut stack: Vec<TreeNode> = vec![TreeNode::dir("", ROOT_NODE_NAME, Vec::new())];
    let mut skipped = 0usize;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_TREE_DEPTH)
        .sort_by(|a, b| {
            b.file_type()
                .is_dir()
                .cmp(&a.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entry");
                skipped += 1;
                continue;
            }
        };
        let depth = entry.depth();
        close_to_depth(&mut stack, depth);
        let path = match relative_path(root, entry.path()) {
            Some(p) => p,
            None => continue,
        };
        stack.push(TreeNode {
            path,
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory: entry.file_type().is_dir(),
            children: Vec::new(),
        });
    }
    close_to_depth(&mut stack, 1);

    if skipped > 0 {
        tracing::warn!(root = %root.display(), skipped, "Some entries could not be read");
    }

    stack.pop().ok_or_else(|| ProviderError::RootUnreadable {
        path: root.to_path_buf(),
        reason: "empty walk".to_string(),
    })
}

/// Pop open nodes until `stack.len() == depth`, attaching each to its parent.
fn close_to_depth(stack: &mut Vec<TreeNode>, depth: usize) {
    while stack.len() > depth.max(1) {
        let Some(done) = stack.pop() else { break };
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

/// `/`-separated path of `full` relative to `root`; `None` if outside it.
fn relative_path(root: &Path, full: &Path) -> Option<String> {
    let rel = full.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn check_root(root: &Path) -> Result<(), ProviderError> {
    let meta = std::fs::metadata(root).map_err(|e| ProviderError::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(ProviderError::RootUnreadable {
            path: root.to_path_buf(),
            reason: "root is not a directory".to_string(),
        });
    }
    Ok(())
}

impl BlueprintProvider for LocalProvider {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn list_projects(&self) -> Result<Vec<Project>, ProviderError> {
        Ok(self.catalog.projects())
    }

    fn list_agents(&self) -> Result<Vec<Agent>, ProviderError> {
        Ok(self.catalog.agents())
    }

    fn fetch_tree(&self, project_id: &str) -> Result<TreeNode, ProviderError> {
        let root = self.project_root(project_id)?;
        let tree = self.walk(&root)?;
        tracing::debug!(root = %root.display(), "Tree built");
        Ok(tree)
    }

    fn fetch_zones(&self, project_id: &str) -> Result<Vec<Zone>, ProviderError> {
        Ok(self.catalog.zones(project_id))
    }

    fn fetch_matching_paths(
        &self,
        pattern: &str,
        project_id: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let root = self.project_root(project_id)?;
        let regex = regex::Regex::new(pattern).map_err(|e| ProviderError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let tree = self.recent_or_walk(&root)?;
        Ok(match_paths(&regex, flatten_paths(&tree)))
    }

    fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        self.catalog.create_zone(draft)
    }

    fn update_zone(&self, zone_id: &str, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        self.catalog.update_zone(zone_id, draft)
    }

    fn assign_path_to_zone(&self, zone_id: &str, path: &str) -> Result<Zone, ProviderError> {
        self.catalog.assign_path(zone_id, path)
    }

    fn add_ignored_path(&self, project_id: &str, path: &str) -> Result<Project, ProviderError> {
        self.catalog.add_ignored_path(project_id, path)
    }

    fn remove_ignored_path(&self, project_id: &str, path: &str) -> Result<Project, ProviderError> {
        self.catalog.remove_ignored_path(project_id, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), b"").unwrap();
        dir
    }

    #[test]
    fn test_matches_reuse_the_last_walk() {
        let dir = project();
        let provider = LocalProvider::new(dir.path());
        provider.fetch_tree("").unwrap();
        assert_eq!(provider.fetch_matching_paths("main", "").unwrap(), vec!["src/main.rs"]);
        assert_eq!(provider.fetch_matching_paths("^src$", "").unwrap(), vec!["src"]);
        assert_eq!(provider.walk_count(), 1);
    }

    #[test]
    fn test_fetch_tree_always_walks() {
        let dir = project();
        let provider = LocalProvider::new(dir.path());
        provider.fetch_tree("").unwrap();
        fs::write(dir.path().join("README.md"), b"").unwrap();
        let tree = provider.fetch_tree("").unwrap();
        assert_eq!(provider.walk_count(), 2);
        assert!(flatten_paths(&tree).contains(&"README.md"));
        assert_eq!(provider.fetch_matching_paths("README", "").unwrap(), vec!["README.md"]);
    }

    #[test]
    fn test_invalid_pattern_does_not_walk() {
        let dir = project();
        let provider = LocalProvider::new(dir.path());
        assert!(provider.fetch_matching_paths("(", "").is_err());
        assert_eq!(provider.walk_count(), 0);
    }
}
