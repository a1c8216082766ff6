// ZoneLens - app/store.rs
//
// Designer store: the single owner of the selected project's tree, zones, and
// derived highlights.
//
// Architecture:
//   - Each state transition (project selected, refresh, zone mutation) issues
//     exactly one background load: fetch tree, fetch zones, resolve.
//   - Loads are tagged with a generation; `poll` applies only the latest and
//     drops anything older.
//   - Highlights are replaced wholesale by every applied load.
//   - Zone mutations call the provider directly and then reload, so the zone
//     cache never outlives a change. Ignore-list changes only replace the
//     cached project; the tree itself is unchanged.
//   - The store owns the pattern playground, so a project switch cancels its
//     pending timer and in-flight evaluation in the same call.

use crate::app::debounce::PatternDebouncer;
use crate::core::model::{Project, TreeNode, Zone, ZoneDraft, ZoneHighlights};
use crate::core::provider::{BlueprintProvider, ProviderMatcher};
use crate::core::resolver;
use crate::core::tree::{filter_ignored, node_count, normalize_path};
use crate::util::error::ProviderError;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Everything one load produces.
#[derive(Debug)]
struct Snapshot {
    tree: TreeNode,
    zones: Vec<Zone>,
    highlights: ZoneHighlights,
}

#[derive(Debug)]
struct LoadOutcome {
    generation: u64,
    result: Result<Snapshot, ProviderError>,
}

/// Selected project plus its cached tree, zones, and highlights.
pub struct DesignerStore {
    provider: Arc<dyn BlueprintProvider>,
    project: Option<Project>,
    snapshot: Option<Snapshot>,
    loading: bool,
    error: Option<ProviderError>,
    generation: u64,
    tx: mpsc::Sender<LoadOutcome>,
    rx: mpsc::Receiver<LoadOutcome>,
    playground: PatternDebouncer,
}

impl DesignerStore {
    pub fn new(provider: Arc<dyn BlueprintProvider>) -> Self {
        let (tx, rx) = mpsc::channel();
        let playground = PatternDebouncer::new(Arc::clone(&provider), "");
        Self {
            provider,
            project: None,
            snapshot: None,
            loading: false,
            error: None,
            generation: 0,
            tx,
            rx,
            playground,
        }
    }

    pub fn provider(&self) -> &Arc<dyn BlueprintProvider> {
        &self.provider
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Failure of the most recent load, if it failed.
    pub fn error(&self) -> Option<&ProviderError> {
        self.error.as_ref()
    }

    /// Take ownership of the last load failure.
    pub fn take_error(&mut self) -> Option<ProviderError> {
        self.error.take()
    }

    /// Full tree of the selected project (ignored paths included).
    pub fn tree(&self) -> Option<&TreeNode> {
        self.snapshot.as_ref().map(|s| &s.tree)
    }

    pub fn zones(&self) -> &[Zone] {
        self.snapshot.as_ref().map(|s| s.zones.as_slice()).unwrap_or(&[])
    }

    pub fn highlights(&self) -> Option<&ZoneHighlights> {
        self.snapshot.as_ref().map(|s| &s.highlights)
    }

    /// Pattern playground bound to the selected project.
    pub fn playground(&self) -> &PatternDebouncer {
        &self.playground
    }

    pub fn playground_mut(&mut self) -> &mut PatternDebouncer {
        &mut self.playground
    }

    /// Tree for display: the project's ignored paths removed.
    pub fn visible_tree(&self) -> Option<TreeNode> {
        let tree = self.tree()?;
        match &self.project {
            Some(project) => filter_ignored(tree, &project.ignored_paths),
            None => Some(tree.clone()),
        }
    }

    /// Select `project` and start loading it. Data of the previous project is
    /// cleared immediately and the playground moves to the new project.
    pub fn select_project(&mut self, project: Project) {
        tracing::info!(project = %project.id, "Project selected");
        self.playground.set_project(&project.id, Instant::now());
        self.project = Some(project);
        self.snapshot = None;
        self.start_load();
    }

    /// Reload tree, zones, and highlights for the selected project.
    /// Current data stays visible until the reload lands.
    pub fn refresh(&mut self) {
        if self.project.is_some() {
            self.start_load();
        }
    }

    /// Apply finished loads. Returns true if the store changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Block until the current load lands or `timeout` elapses.
    /// Returns true if nothing is loading afterwards.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.loading {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.apply(outcome);
                }
                Err(_) => return false,
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Zone mutations (blocking provider calls, then a reload)
    // -------------------------------------------------------------------------

    /// Create a zone in the selected project.
    pub fn create_zone(&mut self, mut draft: ZoneDraft) -> Result<Zone, ProviderError> {
        if draft.project_id.is_empty() {
            draft.project_id = self.project_id().to_string();
        }
        let zone = self.provider.create_zone(&draft)?;
        tracing::info!(zone = %zone.name, id = %zone.id, "Zone created");
        self.refresh();
        Ok(zone)
    }

    pub fn update_zone(&mut self, zone_id: &str, draft: ZoneDraft) -> Result<Zone, ProviderError> {
        let zone = self.provider.update_zone(zone_id, &draft)?;
        tracing::info!(zone = %zone.name, id = %zone.id, "Zone updated");
        self.refresh();
        Ok(zone)
    }

    /// Assign `path` (normalised first) to a zone's explicit paths.
    pub fn assign_path(&mut self, zone_id: &str, path: &str) -> Result<Zone, ProviderError> {
        let path = normalize_path(path);
        let zone = self.provider.assign_path_to_zone(zone_id, &path)?;
        tracing::info!(zone = %zone.name, path = %path, "Path assigned");
        self.refresh();
        Ok(zone)
    }

    // -------------------------------------------------------------------------
    // Ignore list
    // -------------------------------------------------------------------------

    /// Hide `path` (normalised first) and its subtree from `visible_tree`.
    pub fn ignore_path(&mut self, path: &str) -> Result<Project, ProviderError> {
        let path = normalize_path(path);
        let project = self.provider.add_ignored_path(self.project_id(), &path)?;
        tracing::info!(path = %path, "Path ignored");
        self.project = Some(project.clone());
        Ok(project)
    }

    pub fn unignore_path(&mut self, path: &str) -> Result<Project, ProviderError> {
        let path = normalize_path(path);
        let project = self.provider.remove_ignored_path(self.project_id(), &path)?;
        tracing::info!(path = %path, "Path no longer ignored");
        self.project = Some(project.clone());
        Ok(project)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn project_id(&self) -> &str {
        self.project.as_ref().map(|p| p.id.as_str()).unwrap_or("")
    }

    fn start_load(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.loading = true;

        let provider = Arc::clone(&self.provider);
        let project_id = self.project_id().to_string();
        let tx = self.tx.clone();

        tracing::debug!(project = %project_id, generation, "Loading project");
        std::thread::spawn(move || {
            let result = load(provider.as_ref(), &project_id);
            let _ = tx.send(LoadOutcome { generation, result });
        });
    }

    fn apply(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::trace!(
                generation = outcome.generation,
                current = self.generation,
                "Dropping stale load"
            );
            return false;
        }
        self.loading = false;
        match outcome.result {
            Ok(snapshot) => {
                tracing::debug!(
                    nodes = node_count(&snapshot.tree),
                    zones = snapshot.zones.len(),
                    highlighted = snapshot.highlights.highlight_paths.len(),
                    skipped = snapshot.highlights.skipped.len(),
                    "Project loaded"
                );
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Project load failed");
                self.error = Some(e);
            }
        }
        true
    }
}

/// Fetch tree and zones, then resolve. Runs on a background thread.
fn load(provider: &dyn BlueprintProvider, project_id: &str) -> Result<Snapshot, ProviderError> {
    let tree = provider.fetch_tree(project_id)?;
    let zones = provider.fetch_zones(project_id)?;
    let matcher = ProviderMatcher::new(provider, project_id);
    let highlights = resolver::resolve(&zones, &tree, &matcher);
    Ok(Snapshot {
        tree,
        zones,
        highlights,
    })
}
