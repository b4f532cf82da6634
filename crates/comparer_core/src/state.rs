use std::time::Instant;

use crate::view_model::{ComparisonViewModel, SelectionViewModel};
use crate::{LoadingMethod, MetricsPatch, PerformanceMetrics, Selection};

/// Incremented on every start so late updates from a previous run can be
/// told apart.
pub type RunId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Per-method panel state owned by the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    pub method: LoadingMethod,
    pub metrics: PerformanceMetrics,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ViewerState {
    pub fn new(method: LoadingMethod) -> Self {
        Self {
            method,
            metrics: PerformanceMetrics::default(),
            is_loading: false,
            error: None,
        }
    }

    pub fn loading(method: LoadingMethod) -> Self {
        Self {
            is_loading: true,
            ..Self::new(method)
        }
    }

    pub fn phase(&self) -> ViewerPhase {
        if self.error.is_some() {
            ViewerPhase::Errored
        } else if self.is_loading {
            ViewerPhase::Loading
        } else if self.metrics.time_to_first_render.is_some() {
            ViewerPhase::Loaded
        } else {
            ViewerPhase::Idle
        }
    }

    /// Non-destructive merge. An errored panel only goes back to loading
    /// through a patch that also clears the error.
    pub fn apply(&mut self, patch: ViewerPatch) {
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(is_loading) = patch.is_loading {
            if !(is_loading && self.error.is_some()) {
                self.is_loading = is_loading;
            }
        }
        self.metrics.apply(patch.metrics);
    }
}

/// Partial update for one [`ViewerState`]; `None` fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewerPatch {
    pub is_loading: Option<bool>,
    pub error: Option<Option<String>>,
    pub metrics: MetricsPatch,
}

impl ViewerPatch {
    /// Load kicked off: clear any previous error and mark loading.
    pub fn started(start_time: Instant) -> Self {
        Self {
            is_loading: Some(true),
            error: Some(None),
            metrics: MetricsPatch {
                start_time: Some(start_time),
                ..MetricsPatch::default()
            },
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_loading: Some(false),
            error: Some(Some(message.into())),
            metrics: MetricsPatch::default(),
        }
    }

    pub fn first_render(elapsed: std::time::Duration) -> Self {
        Self {
            is_loading: Some(false),
            error: None,
            metrics: MetricsPatch {
                time_to_first_render: Some(elapsed),
                time_to_interactive: Some(elapsed),
                ..MetricsPatch::default()
            },
        }
    }

    pub fn fully_loaded(elapsed: std::time::Duration) -> Self {
        Self {
            metrics: MetricsPatch {
                time_to_fully_loaded: Some(elapsed),
                ..MetricsPatch::default()
            },
            ..Self::default()
        }
    }

    pub fn file_size(bytes: u64) -> Self {
        Self {
            metrics: MetricsPatch {
                file_size: Some(bytes),
                ..MetricsPatch::default()
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    selection: Selection,
    comparison: Selection,
    started: bool,
    run_id: RunId,
    viewers: Vec<ViewerState>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn comparison(&self) -> &Selection {
        &self.comparison
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn viewers(&self) -> &[ViewerState] {
        &self.viewers
    }

    pub fn viewer(&self, method: LoadingMethod) -> Option<&ViewerState> {
        self.viewers.iter().find(|state| state.method == method)
    }

    pub fn selection_view(&self) -> SelectionViewModel {
        SelectionViewModel::from_selection(&self.selection)
    }

    pub fn comparison_view(&self) -> ComparisonViewModel {
        ComparisonViewModel::build(self.started, self.run_id, &self.viewers, self.dirty)
    }

    /// Returns whether anything changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        if self.selection != selection {
            self.selection = selection;
            self.mark_dirty();
        }
    }

    pub(crate) fn open_comparison(&mut self, comparison: Selection) {
        self.viewers = idle_states(&comparison);
        self.comparison = comparison;
        self.started = false;
        self.mark_dirty();
    }

    pub(crate) fn close_comparison(&mut self) {
        self.comparison = Selection::new();
        self.viewers.clear();
        self.started = false;
        self.mark_dirty();
    }

    /// Starts a new run: one loading state per compared method.
    pub(crate) fn start_run(&mut self) -> RunId {
        self.run_id += 1;
        self.started = true;
        self.viewers = self
            .comparison
            .methods()
            .iter()
            .copied()
            .map(ViewerState::loading)
            .collect();
        self.mark_dirty();
        self.run_id
    }

    pub(crate) fn reset_run(&mut self) {
        self.started = false;
        self.viewers = idle_states(&self.comparison);
        self.mark_dirty();
    }

    /// Merges a patch into the matching panel. Patches from stale runs, or
    /// arriving while idle, are dropped.
    pub(crate) fn apply_viewer_patch(
        &mut self,
        run_id: RunId,
        method: LoadingMethod,
        patch: ViewerPatch,
    ) -> bool {
        if !self.started || run_id != self.run_id {
            return false;
        }
        let Some(viewer) = self.viewers.iter_mut().find(|state| state.method == method) else {
            return false;
        };
        let before = viewer.clone();
        viewer.apply(patch);
        let changed = *viewer != before;
        if changed {
            self.mark_dirty();
        }
        changed
    }
}

fn idle_states(selection: &Selection) -> Vec<ViewerState> {
    selection
        .methods()
        .iter()
        .copied()
        .map(ViewerState::new)
        .collect()
}
