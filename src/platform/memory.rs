// ZoneLens - platform/memory.rs
//
// In-memory catalog of projects, zones, and agents, plus the mock backend
// built on it. The mock serves a canned tree and evaluates patterns locally
// so the designer is usable with no server at all.
//
// The catalog is shared by the local filesystem backend, which only replaces
// where trees and matches come from.

use crate::core::model::{Agent, Project, TreeNode, Zone, ZoneDraft};
use crate::core::pattern::match_paths;
use crate::core::provider::BlueprintProvider;
use crate::core::tree::flatten_paths;
use crate::util::constants::{DEFAULT_PROJECT_ID, ROOT_NODE_NAME};
use crate::util::error::ProviderError;
use std::sync::{Mutex, MutexGuard};

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
struct CatalogData {
    projects: Vec<Project>,
    zones: Vec<Zone>,
    agents: Vec<Agent>,
    next_id: u64,
}

impl CatalogData {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn project_mut(&mut self, project_id: &str) -> Result<&mut Project, ProviderError> {
        let id = effective_project_id(project_id);
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ProviderError::NotFound {
                kind: "project",
                id: id.to_string(),
            })
    }

    fn zone_mut(&mut self, zone_id: &str) -> Result<&mut Zone, ProviderError> {
        self.zones
            .iter_mut()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| ProviderError::NotFound {
                kind: "zone",
                id: zone_id.to_string(),
            })
    }
}

/// Thread-safe in-memory store of projects, zones, and agents.
///
/// Zones are returned in creation order.
#[derive(Debug, Default)]
pub struct Catalog {
    data: Mutex<CatalogData>,
}

impl Catalog {
    /// A catalog holding a single default project rooted at `root_dir`.
    pub fn with_default_project(root_dir: &str) -> Self {
        let catalog = Self::default();
        catalog.lock().projects.push(Project {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: DEFAULT_PROJECT_ID.to_string(),
            root_dir: root_dir.to_string(),
            ignored_paths: Default::default(),
        });
        catalog
    }

    fn lock(&self) -> MutexGuard<'_, CatalogData> {
        // Every update is a single push or field write; poisoned data is intact.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an agent. An empty id is generated; a name is required.
    pub fn add_agent(&self, mut agent: Agent) -> Result<Agent, ProviderError> {
        if agent.name.trim().is_empty() {
            return Err(ProviderError::InvalidInput {
                field: "name",
                reason: "agent name is required".to_string(),
            });
        }
        let mut data = self.lock();
        if agent.id.is_empty() {
            agent.id = data.next_id("agent");
        }
        data.agents.push(agent.clone());
        tracing::debug!(agent = %agent.name, id = %agent.id, "Agent added");
        Ok(agent)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.lock().agents.clone()
    }

    /// Look up a project; an empty id selects the default project.
    pub fn project(&self, project_id: &str) -> Result<Project, ProviderError> {
        let id = effective_project_id(project_id);
        self.lock()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                kind: "project",
                id: id.to_string(),
            })
    }

    /// Hide an already-normalised path in a project's tree. Adding twice is a
    /// no-op; the root cannot be ignored.
    pub fn add_ignored_path(&self, project_id: &str, path: &str) -> Result<Project, ProviderError> {
        if path.is_empty() {
            return Err(ProviderError::InvalidInput {
                field: "path",
                reason: "path is required".to_string(),
            });
        }
        let mut data = self.lock();
        let project = data.project_mut(project_id)?;
        project.ignored_paths.insert(path.to_string());
        Ok(project.clone())
    }

    pub fn remove_ignored_path(
        &self,
        project_id: &str,
        path: &str,
    ) -> Result<Project, ProviderError> {
        let mut data = self.lock();
        let project = data.project_mut(project_id)?;
        project.ignored_paths.remove(path);
        Ok(project.clone())
    }

    pub fn zones(&self, project_id: &str) -> Vec<Zone> {
        let id = effective_project_id(project_id);
        self.lock()
            .zones
            .iter()
            .filter(|z| z.project_id == id)
            .cloned()
            .collect()
    }

    pub fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        if draft.name.trim().is_empty() {
            return Err(ProviderError::InvalidInput {
                field: "name",
                reason: "zone name is required".to_string(),
            });
        }
        let mut data = self.lock();
        let zone = Zone {
            id: data.next_id("zone"),
            project_id: effective_project_id(&draft.project_id).to_string(),
            name: draft.name.clone(),
            pattern: draft.pattern.clone(),
            purpose: draft.purpose.clone(),
            constraints: draft.constraints.clone(),
            assigned_agent_id: draft.assigned_agent_id.clone(),
            explicit_paths: Default::default(),
        };
        data.zones.push(zone.clone());
        tracing::debug!(zone = %zone.name, id = %zone.id, "Zone created");
        Ok(zone)
    }

    /// Replace a zone's editable fields. An empty name keeps the current name.
    pub fn update_zone(&self, zone_id: &str, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        let mut data = self.lock();
        let zone = data.zone_mut(zone_id)?;
        if !draft.name.trim().is_empty() {
            zone.name = draft.name.clone();
        }
        zone.pattern = draft.pattern.clone();
        zone.purpose = draft.purpose.clone();
        zone.constraints = draft.constraints.clone();
        zone.assigned_agent_id = draft.assigned_agent_id.clone();
        Ok(zone.clone())
    }

    /// Add `path` to a zone's explicit paths. Assigning twice is a no-op.
    pub fn assign_path(&self, zone_id: &str, path: &str) -> Result<Zone, ProviderError> {
        let mut data = self.lock();
        let zone = data.zone_mut(zone_id)?;
        zone.explicit_paths.insert(path.to_string());
        Ok(zone.clone())
    }
}

fn effective_project_id(project_id: &str) -> &str {
    if project_id.is_empty() {
        DEFAULT_PROJECT_ID
    } else {
        project_id
    }
}

// =============================================================================
// Mock backend
// =============================================================================

/// Backend serving a fixed tree from memory.
pub struct MockProvider {
    catalog: Catalog,
    tree: TreeNode,
}

impl MockProvider {
    /// Mock with the default canned tree and an empty catalog.
    pub fn new() -> Self {
        Self::with_tree(canned_tree())
    }

    pub fn with_tree(tree: TreeNode) -> Self {
        Self {
            catalog: Catalog::with_default_project(ROOT_NODE_NAME),
            tree,
        }
    }

    /// Access to the backing catalog (for seeding zones and agents).
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// The small placeholder tree shown when no real backend is configured.
pub fn canned_tree() -> TreeNode {
    TreeNode::dir(
        "",
        ROOT_NODE_NAME,
        vec![
            TreeNode::dir("cmd", "cmd", vec![]),
            TreeNode::dir("internal", "internal", vec![]),
            TreeNode::dir("web", "web", vec![]),
        ],
    )
}

impl BlueprintProvider for MockProvider {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn list_projects(&self) -> Result<Vec<Project>, ProviderError> {
        Ok(self.catalog.projects())
    }

    fn list_agents(&self) -> Result<Vec<Agent>, ProviderError> {
        Ok(self.catalog.agents())
    }

    fn fetch_tree(&self, project_id: &str) -> Result<TreeNode, ProviderError> {
        self.catalog.project(project_id)?;
        Ok(self.tree.clone())
    }

    fn fetch_zones(&self, project_id: &str) -> Result<Vec<Zone>, ProviderError> {
        Ok(self.catalog.zones(project_id))
    }

    fn fetch_matching_paths(
        &self,
        pattern: &str,
        project_id: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.catalog.project(project_id)?;
        let regex = regex::Regex::new(pattern).map_err(|e| ProviderError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(match_paths(&regex, flatten_paths(&self.tree)))
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
