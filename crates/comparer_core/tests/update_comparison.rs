use std::sync::Once;
use std::time::{Duration, Instant};

use comparer_core::{
    update, AppState, Effect, LoadingMethod, Msg, PanelStatus, PerformanceMetrics, Selection,
    ViewerPatch, ViewerPhase,
};
use pretty_assertions::assert_eq;

use LoadingMethod::*;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(comparer_logging::initialize_for_tests);
}

fn selections() -> Vec<Selection> {
    vec![
        Selection::from_methods([Standard]),
        Selection::from_methods([Linearized]),
        Selection::from_methods([DocumentEngine]),
        Selection::from_methods([Standard, Linearized]),
        Selection::from_methods([DocumentEngine, Standard]),
        Selection::from_methods([Linearized, DocumentEngine]),
        Selection::from_methods([Standard, Linearized, DocumentEngine]),
        Selection::from_methods([DocumentEngine, Linearized, Standard]),
    ]
}

fn open(selection: &Selection) -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::CompareOpened {
            methods: Some(selection.to_query()),
        },
    );
    assert!(effects.is_empty());
    state
}

fn viewer_update(run_id: u64, method: LoadingMethod, patch: ViewerPatch) -> Msg {
    Msg::ViewerUpdated {
        run_id,
        method,
        patch,
    }
}

#[test]
fn opening_comparison_creates_idle_panels() {
    init_logging();
    let state = open(&Selection::from_methods([Linearized, Standard]));
    let view = state.comparison_view();
    assert!(!view.started);
    assert_eq!(view.method_count_label, "2 Methods");
    assert_eq!(view.grid_columns, 2);
    assert_eq!(
        view.panels.iter().map(|p| p.method).collect::<Vec<_>>(),
        vec![Linearized, Standard]
    );
    assert!(view.panels.iter().all(|p| p.status == PanelStatus::Idle));
    assert!(view.panels.iter().all(|p| p.first_render == "—"));
}

#[test]
fn start_initializes_one_loading_state_per_method() {
    init_logging();
    for selection in selections() {
        let (state, effects) = update(open(&selection), Msg::StartClicked);

        assert_eq!(
            effects,
            vec![Effect::StartViewers {
                run_id: 1,
                methods: selection.methods().to_vec(),
            }]
        );
        assert!(state.is_started());
        assert_eq!(state.viewers().len(), selection.len());
        for (viewer, method) in state.viewers().iter().zip(selection.methods()) {
            assert_eq!(viewer.method, *method);
            assert!(viewer.is_loading);
            assert!(viewer.metrics.is_empty());
            assert_eq!(viewer.error, None);
        }
    }
}

#[test]
fn start_while_running_is_ignored() {
    init_logging();
    let (state, _) = update(open(&Selection::from_methods([Standard])), Msg::StartClicked);
    let (next, effects) = update(state.clone(), Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn reset_clears_metrics_and_errors_for_every_selection_size() {
    init_logging();
    for selection in selections() {
        let (mut state, _) = update(open(&selection), Msg::StartClicked);
        let run_id = state.run_id();
        for (index, method) in selection.methods().iter().enumerate() {
            let patch = if index % 2 == 0 {
                ViewerPatch::first_render(Duration::from_millis(300))
            } else {
                ViewerPatch::failed("Failed to load viewer")
            };
            state = update(state, viewer_update(run_id, *method, patch)).0;
            state = update(state, viewer_update(run_id, *method, ViewerPatch::file_size(4096))).0;
        }

        let (state, effects) = update(state, Msg::ResetClicked);
        assert_eq!(effects, vec![Effect::ResetViewers]);
        assert!(!state.is_started());
        assert_eq!(state.viewers().len(), selection.len());
        for viewer in state.viewers() {
            assert_eq!(viewer.metrics, PerformanceMetrics::default());
            assert_eq!(viewer.error, None);
            assert!(!viewer.is_loading);
        }
    }
}

#[test]
fn reset_while_idle_is_ignored() {
    init_logging();
    let state = open(&Selection::from_methods([Standard]));
    let (next, effects) = update(state.clone(), Msg::ResetClicked);
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn failure_in_one_panel_leaves_siblings_untouched() {
    init_logging();
    let selection = Selection::from_methods([Standard, DocumentEngine, Linearized]);
    let (state, _) = update(open(&selection), Msg::StartClicked);
    let run_id = state.run_id();
    let started = Instant::now();

    let mut state = state;
    for method in selection.methods() {
        state = update(state, viewer_update(run_id, *method, ViewerPatch::started(started))).0;
    }
    let (state, _) = update(
        state,
        viewer_update(
            run_id,
            DocumentEngine,
            ViewerPatch::failed("Nutrient DWS credentials not configured"),
        ),
    );
    let (state, _) = update(
        state,
        viewer_update(
            run_id,
            Standard,
            ViewerPatch::first_render(Duration::from_millis(900)),
        ),
    );

    let engine = state.viewer(DocumentEngine).unwrap();
    assert_eq!(engine.phase(), ViewerPhase::Errored);
    assert!(!engine.is_loading);
    assert_eq!(
        engine.error.as_deref(),
        Some("Nutrient DWS credentials not configured")
    );

    assert_eq!(state.viewer(Standard).unwrap().phase(), ViewerPhase::Loaded);
    let linearized = state.viewer(Linearized).unwrap();
    assert_eq!(linearized.phase(), ViewerPhase::Loading);
    assert_eq!(linearized.metrics.start_time, Some(started));

    let view = state.comparison_view();
    let statuses: Vec<_> = view.panels.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![PanelStatus::Idle, PanelStatus::Error, PanelStatus::Loading]
    );
}

#[test]
fn updates_from_previous_run_are_dropped() {
    init_logging();
    let selection = Selection::from_methods([Standard]);
    let (state, _) = update(open(&selection), Msg::StartClicked);
    let stale = state.run_id();
    let (state, _) = update(state, Msg::ResetClicked);
    let (state, _) = update(state, Msg::StartClicked);
    assert_eq!(state.run_id(), stale + 1);

    let (mut state, _) = update(
        state,
        viewer_update(stale, Standard, ViewerPatch::failed("late failure")),
    );
    assert_eq!(state.viewer(Standard).unwrap().error, None);
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        viewer_update(stale, Standard, ViewerPatch::file_size(1)),
    );
    assert!(!state.consume_dirty());
}

#[test]
fn fully_loaded_is_never_before_first_render() {
    init_logging();
    let selection = Selection::from_methods([Linearized]);
    let timings = [(10, 5), (10, 10), (10, 2500), (3000, 200), (0, 0)];
    for (first_ms, full_ms) in timings {
        let (state, _) = update(open(&selection), Msg::StartClicked);
        let run_id = state.run_id();
        let (state, _) = update(
            state,
            viewer_update(
                run_id,
                Linearized,
                ViewerPatch::fully_loaded(Duration::from_millis(full_ms)),
            ),
        );
        let (state, _) = update(
            state,
            viewer_update(
                run_id,
                Linearized,
                ViewerPatch::first_render(Duration::from_millis(first_ms)),
            ),
        );
        let metrics = state.viewer(Linearized).unwrap().metrics;
        let first = metrics.time_to_first_render.unwrap();
        let full = metrics.time_to_fully_loaded.unwrap();
        assert!(full >= first, "{full:?} < {first:?}");
        assert_eq!(metrics.time_to_interactive, Some(first));
    }
}

#[test]
fn panel_shows_loaded_only_after_full_load() {
    init_logging();
    let selection = Selection::from_methods([Standard]);
    let (state, _) = update(open(&selection), Msg::StartClicked);
    let run_id = state.run_id();
    let (state, _) = update(
        state,
        viewer_update(
            run_id,
            Standard,
            ViewerPatch::first_render(Duration::from_millis(1250)),
        ),
    );
    let panel = &state.comparison_view().panels[0];
    assert_eq!(panel.status, PanelStatus::Idle);
    assert_eq!(panel.first_render, "1.25s");
    assert_eq!(panel.interactive, "1.25s");
    assert_eq!(panel.fully_loaded, "—");

    let (state, _) = update(
        state,
        viewer_update(
            run_id,
            Standard,
            ViewerPatch::fully_loaded(Duration::from_millis(2000)),
        ),
    );
    let (state, _) = update(
        state,
        viewer_update(run_id, Standard, ViewerPatch::file_size(5 * 1024 * 1024)),
    );
    let panel = &state.comparison_view().panels[0];
    assert_eq!(panel.status, PanelStatus::Loaded);
    assert_eq!(panel.status.badge(), Some("Loaded"));
    assert_eq!(panel.fully_loaded, "2.00s");
    assert_eq!(panel.file_size, "5.00 MB");
}

#[test]
fn reopening_with_other_methods_resets_running_comparison() {
    init_logging();
    let (state, _) = update(
        open(&Selection::from_methods([Standard])),
        Msg::StartClicked,
    );
    let (same, effects) = update(
        state.clone(),
        Msg::CompareOpened {
            methods: Some("standard".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert!(same.is_started());

    let (next, effects) = update(
        state,
        Msg::CompareOpened {
            methods: Some("linearized,document-engine".to_string()),
        },
    );
    assert_eq!(effects, vec![Effect::ResetViewers]);
    assert!(!next.is_started());
    assert_eq!(next.comparison().methods(), &[Linearized, DocumentEngine]);
}
