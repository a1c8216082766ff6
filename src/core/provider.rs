// ZoneLens - core/provider.rs
//
// The backend seam. Trees, zones, and pattern matches come from a single
// injected collaborator; the implementation (in-memory mock, local
// filesystem, or HTTP) is chosen once at startup.
//
// All methods are blocking. Callers on an interactive thread run them on a
// background thread (see app::debounce and app::store).

use crate::core::model::{Agent, Project, TreeNode, Zone, ZoneDraft};
use crate::core::pattern::PatternMatcher;
use crate::util::error::{EvalError, ProviderError};

/// Tree / zone / pattern provider.
///
/// An empty `project_id` selects the backend's default root.
pub trait BlueprintProvider: Send + Sync {
    /// Short label for logging ("mock", "local", "http").
    fn kind(&self) -> &'static str;

    fn list_projects(&self) -> Result<Vec<Project>, ProviderError>;

    fn list_agents(&self) -> Result<Vec<Agent>, ProviderError>;

    /// The project's full tree. Path invariants of `TreeNode` hold.
    fn fetch_tree(&self, project_id: &str) -> Result<TreeNode, ProviderError>;

    fn fetch_zones(&self, project_id: &str) -> Result<Vec<Zone>, ProviderError>;

    /// Relative paths matching `pattern` (search semantics).
    ///
    /// A malformed pattern must be reported either as
    /// `ProviderError::InvalidPattern` or as a status message the
    /// invalid-pattern heuristic recognises.
    fn fetch_matching_paths(
        &self,
        pattern: &str,
        project_id: &str,
    ) -> Result<Vec<String>, ProviderError>;

    fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ProviderError>;

    fn update_zone(&self, zone_id: &str, draft: &ZoneDraft) -> Result<Zone, ProviderError>;

    /// Add an already-normalised path to a zone's explicit paths.
    fn assign_path_to_zone(&self, zone_id: &str, path: &str) -> Result<Zone, ProviderError>;

    /// Hide an already-normalised path (and its subtree) from the project's
    /// tree view. Returns the updated project.
    fn add_ignored_path(&self, project_id: &str, path: &str) -> Result<Project, ProviderError> {
        let _ = (project_id, path);
        Err(ProviderError::Unsupported {
            backend: self.kind(),
            operation: "ignored paths",
        })
    }

    fn remove_ignored_path(&self, project_id: &str, path: &str) -> Result<Project, ProviderError> {
        let _ = (project_id, path);
        Err(ProviderError::Unsupported {
            backend: self.kind(),
            operation: "ignored paths",
        })
    }
}

/// Adapts a provider to `PatternMatcher` for one project, classifying
/// provider failures into pattern vs transport errors.
pub struct ProviderMatcher<'a> {
    provider: &'a dyn BlueprintProvider,
    project_id: &'a str,
}

impl<'a> ProviderMatcher<'a> {
    pub fn new(provider: &'a dyn BlueprintProvider, project_id: &'a str) -> Self {
        Self {
            provider,
            project_id,
        }
    }
}

impl PatternMatcher for ProviderMatcher<'_> {
    fn matching_paths(&self, pattern: &str) -> Result<Vec<String>, EvalError> {
        self.provider
            .fetch_matching_paths(pattern, self.project_id)
            .map_err(|e| EvalError::from_provider(pattern, e))
    }
}
