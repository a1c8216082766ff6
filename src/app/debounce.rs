// ZoneLens - app/debounce.rs
//
// Pattern playground controller. Collapses rapid pattern edits into one
// evaluation per quiescent window and runs that evaluation on a background
// thread.
//
// Architecture:
//   - `PatternDebouncer` lives on the event-loop thread and is clock-injected:
//     callers pass the current `Instant` to `set_pattern` and `poll`.
//   - At most one timer is pending; each edit replaces it.
//   - Every dispatch bumps a generation counter. Results travel back over an
//     mpsc channel tagged with their generation; stale ones are dropped.
//   - A blank pattern resets the state synchronously and invalidates both the
//     pending timer and any in-flight evaluation.

use crate::core::pattern;
use crate::core::provider::{BlueprintProvider, ProviderMatcher};
use crate::util::constants::{MAX_EVAL_MESSAGES_PER_POLL, PATTERN_DEBOUNCE_MS};
use crate::util::error::EvalError;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Displayed state of the playground.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchState {
    /// Pattern the current `paths` / `error` belong to.
    pub pattern: String,
    pub paths: Vec<String>,
    /// An evaluation for `pattern` is in flight.
    pub loading: bool,
    pub error: Option<EvalError>,
}

impl MatchState {
    /// True when the input itself is at fault (render inline on the input).
    pub fn invalid_pattern(&self) -> bool {
        self.error.as_ref().is_some_and(EvalError::is_pattern)
    }
}

/// Result of one background evaluation.
#[derive(Debug)]
struct EvalOutcome {
    generation: u64,
    pattern: String,
    result: Result<Vec<String>, EvalError>,
}

struct PendingEdit {
    pattern: String,
    deadline: Instant,
}

/// Debounced, generation-tagged pattern evaluation against a provider.
pub struct PatternDebouncer {
    provider: Arc<dyn BlueprintProvider>,
    project_id: String,
    window: Duration,
    /// Latest value of the input field.
    input: String,
    pending: Option<PendingEdit>,
    generation: u64,
    tx: mpsc::Sender<EvalOutcome>,
    rx: mpsc::Receiver<EvalOutcome>,
    state: MatchState,
}

impl PatternDebouncer {
    pub fn new(provider: Arc<dyn BlueprintProvider>, project_id: &str) -> Self {
        Self::with_window(provider, project_id, Duration::from_millis(PATTERN_DEBOUNCE_MS))
    }

    pub fn with_window(
        provider: Arc<dyn BlueprintProvider>,
        project_id: &str,
        window: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            provider,
            project_id: project_id.to_string(),
            window,
            input: String::new(),
            pending: None,
            generation: 0,
            tx,
            rx,
            state: MatchState::default(),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// When the pending timer fires, if one is set.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Record an edit of the pattern field at time `now`.
    pub fn set_pattern(&mut self, pattern: &str, now: Instant) {
        self.input = pattern.to_string();
        if pattern.trim().is_empty() {
            self.reset();
            return;
        }
        self.pending = Some(PendingEdit {
            pattern: pattern.to_string(),
            deadline: now + self.window,
        });
    }

    /// Switch project. Pending and in-flight work for the old project is
    /// discarded and the current input is re-scheduled.
    pub fn set_project(&mut self, project_id: &str, now: Instant) {
        if self.project_id == project_id {
            return;
        }
        tracing::debug!(from = %self.project_id, to = %project_id, "Playground project changed");
        self.project_id = project_id.to_string();
        let input = std::mem::take(&mut self.input);
        self.reset();
        self.set_pattern(&input, now);
    }

    /// Evaluate the latest input immediately after a transport failure.
    ///
    /// An edit made since the failure is the one evaluated, and its pending
    /// timer is consumed. Returns false if there is nothing to retry.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.state.error, Some(EvalError::Transport { .. })) {
            return false;
        }
        self.pending = None;
        self.dispatch(self.input.clone());
        true
    }

    /// Hide a transport failure message. Pattern errors stay until the
    /// input changes.
    pub fn dismiss_error(&mut self) {
        if matches!(self.state.error, Some(EvalError::Transport { .. })) {
            self.state.error = None;
        }
    }

    /// Fire the timer if due and apply finished evaluations.
    ///
    /// Returns true if the displayed state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;

        for _ in 0..MAX_EVAL_MESSAGES_PER_POLL {
            match self.rx.try_recv() {
                Ok(outcome) => changed |= self.apply(outcome),
                Err(_) => break,
            }
        }

        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            if let Some(edit) = self.pending.take() {
                self.dispatch(edit.pattern);
                changed = true;
            }
        }

        changed
    }

    /// Block until the in-flight evaluation lands or `timeout` elapses.
    ///
    /// Does not fire a pending timer. Returns true if nothing is in flight
    /// afterwards.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state.loading {
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

    fn reset(&mut self) {
        self.pending = None;
        // Anything still in flight is now stale.
        self.generation += 1;
        self.state = MatchState::default();
    }

    fn dispatch(&mut self, pattern: String) {
        self.generation += 1;
        let generation = self.generation;
        self.state.pattern = pattern.clone();
        self.state.loading = true;

        let provider = Arc::clone(&self.provider);
        let project_id = self.project_id.clone();
        let tx = self.tx.clone();

        tracing::debug!(pattern = %pattern, generation, "Evaluating pattern");
        std::thread::spawn(move || {
            let matcher = ProviderMatcher::new(provider.as_ref(), &project_id);
            let result = pattern::evaluate(&pattern, &matcher);
            // Receiver gone means the controller was dropped; nothing to do.
            let _ = tx.send(EvalOutcome {
                generation,
                pattern,
                result,
            });
        });
    }

    fn apply(&mut self, outcome: EvalOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::trace!(
                pattern = %outcome.pattern,
                generation = outcome.generation,
                current = self.generation,
                "Dropping stale evaluation"
            );
            return false;
        }
        self.state.loading = false;
        match outcome.result {
            Ok(paths) => {
                tracing::debug!(pattern = %outcome.pattern, count = paths.len(), "Pattern matched");
                self.state.paths = paths;
                self.state.error = None;
            }
            Err(e) => {
                tracing::debug!(pattern = %outcome.pattern, error = %e, "Pattern evaluation failed");
                self.state.paths.clear();
                self.state.error = Some(e);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Agent, Project, TreeNode, Zone, ZoneDraft};
    use crate::platform::memory::MockProvider;
    use crate::util::error::ProviderError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Mock backend that records every pattern it is asked to match.
    #[derive(Default)]
    struct CountingProvider {
        inner: MockProvider,
        calls: Mutex<Vec<String>>,
        offline: AtomicBool,
    }

    impl CountingProvider {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl BlueprintProvider for CountingProvider {
        fn kind(&self) -> &'static str {
            "counting"
        }
        fn list_projects(&self) -> Result<Vec<Project>, ProviderError> {
            self.inner.list_projects()
        }
        fn list_agents(&self) -> Result<Vec<Agent>, ProviderError> {
            self.inner.list_agents()
        }
        fn fetch_tree(&self, project_id: &str) -> Result<TreeNode, ProviderError> {
            self.inner.fetch_tree(project_id)
        }
        fn fetch_zones(&self, project_id: &str) -> Result<Vec<Zone>, ProviderError> {
            self.inner.fetch_zones(project_id)
        }
        fn fetch_matching_paths(
            &self,
            pattern: &str,
            project_id: &str,
        ) -> Result<Vec<String>, ProviderError> {
            self.calls.lock().unwrap().push(pattern.to_string());
            if self.offline.load(Ordering::SeqCst) {
                return Err(ProviderError::Status {
                    status: 503,
                    message: "connection reset by peer".to_string(),
                });
            }
            self.inner.fetch_matching_paths(pattern, project_id)
        }
        fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
            self.inner.create_zone(draft)
        }
        fn update_zone(&self, zone_id: &str, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
            self.inner.update_zone(zone_id, draft)
        }
        fn assign_path_to_zone(&self, zone_id: &str, path: &str) -> Result<Zone, ProviderError> {
            self.inner.assign_path_to_zone(zone_id, path)
        }
    }

    const WINDOW: Duration = Duration::from_millis(PATTERN_DEBOUNCE_MS);

    fn setup() -> (Arc<CountingProvider>, PatternDebouncer) {
        let provider = Arc::new(CountingProvider::default());
        let debouncer = PatternDebouncer::new(provider.clone(), "");
        (provider, debouncer)
    }

    fn wait(debouncer: &mut PatternDebouncer) {
        assert!(debouncer.wait(Duration::from_secs(5)), "evaluation did not finish");
    }

    #[test]
    fn test_keystrokes_within_window_collapse_to_one_evaluation() {
        let (provider, mut d) = setup();
        let t0 = Instant::now();
        d.set_pattern("a", t0);
        d.poll(t0 + Duration::from_millis(100));
        d.set_pattern("ab", t0 + Duration::from_millis(150));
        d.poll(t0 + Duration::from_millis(300));
        d.set_pattern("abc", t0 + Duration::from_millis(350));
        assert!(!d.poll(t0 + Duration::from_millis(700)));
        assert!(d.poll(t0 + Duration::from_millis(350) + WINDOW));
        wait(&mut d);
        assert_eq!(provider.calls(), vec!["abc"]);
        assert_eq!(d.state().pattern, "abc");
        assert!(d.next_deadline().is_none());
    }

    #[test]
    fn test_blank_pattern_resets_synchronously() {
        let (provider, mut d) = setup();
        let t0 = Instant::now();
        d.set_pattern("cmd", t0);
        d.poll(t0 + WINDOW);
        wait(&mut d);
        assert_eq!(d.state().paths, vec!["cmd"]);

        d.set_pattern("web", t0 + WINDOW);
        d.set_pattern("   ", t0 + WINDOW);
        assert_eq!(*d.state(), MatchState::default());
        assert!(d.next_deadline().is_none());
        d.poll(t0 + WINDOW * 3);
        assert_eq!(provider.calls(), vec!["cmd"]);
    }

    #[test]
    fn test_malformed_pattern_is_pattern_error() {
        let (provider, mut d) = setup();
        let t0 = Instant::now();
        d.set_pattern("[abc", t0);
        d.poll(t0 + WINDOW);
        wait(&mut d);
        assert!(d.state().invalid_pattern());
        assert!(d.state().paths.is_empty());
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn test_network_failure_is_transport_error_and_retryable() {
        let (provider, mut d) = setup();
        provider.offline.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        d.set_pattern("^cmd", t0);
        d.poll(t0 + WINDOW);
        wait(&mut d);
        assert!(matches!(d.state().error, Some(EvalError::Transport { .. })));
        assert!(!d.state().invalid_pattern());

        provider.offline.store(false, Ordering::SeqCst);
        assert!(d.retry());
        wait(&mut d);
        assert_eq!(d.state().paths, vec!["cmd"]);
        assert!(d.state().error.is_none());
        assert_eq!(provider.calls(), vec!["^cmd", "^cmd"]);
    }

    #[test]
    fn test_retry_evaluates_edit_made_after_failure() {
        let (provider, mut d) = setup();
        provider.offline.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        d.set_pattern("cmd", t0);
        d.poll(t0 + WINDOW);
        wait(&mut d);
        assert!(matches!(d.state().error, Some(EvalError::Transport { .. })));

        provider.offline.store(false, Ordering::SeqCst);
        d.set_pattern("web", t0 + WINDOW + Duration::from_millis(50));
        assert!(d.retry());
        assert!(d.next_deadline().is_none());
        wait(&mut d);
        assert_eq!(d.state().pattern, d.input());
        assert_eq!(d.state().paths, vec!["web"]);
        assert_eq!(provider.calls(), vec!["cmd", "web"]);

        // The consumed timer does not fire a second evaluation.
        assert!(!d.poll(t0 + WINDOW * 3));
        assert_eq!(provider.calls(), vec!["cmd", "web"]);
    }

    #[test]
    fn test_dismiss_only_clears_transport_errors() {
        let (provider, mut d) = setup();
        provider.offline.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        d.set_pattern("cmd", t0);
        d.poll(t0 + WINDOW);
        wait(&mut d);
        d.dismiss_error();
        assert!(d.state().error.is_none());

        d.set_pattern("(", t0 + WINDOW);
        d.poll(t0 + WINDOW * 2);
        wait(&mut d);
        d.dismiss_error();
        assert!(d.state().invalid_pattern());
        assert!(!d.retry());
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let (_, mut d) = setup();
        let t0 = Instant::now();
        d.set_pattern("cmd", t0);
        d.poll(t0 + WINDOW);
        // Clearing before the result lands makes it stale.
        d.set_pattern("", t0 + WINDOW);
        std::thread::sleep(Duration::from_millis(50));
        d.poll(t0 + WINDOW * 2);
        assert_eq!(*d.state(), MatchState::default());
    }

    #[test]
    fn test_project_change_cancels_pending_timer() {
        let (provider, mut d) = setup();
        let t0 = Instant::now();
        d.set_pattern("web", t0);
        d.set_project("other", t0 + Duration::from_millis(300));
        // The old deadline passes without firing.
        assert!(!d.poll(t0 + WINDOW));
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(300) + WINDOW));
        assert_eq!(d.input(), "web");
        assert!(provider.calls().is_empty());
    }
}
