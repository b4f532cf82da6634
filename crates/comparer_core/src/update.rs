use crate::{AppState, Effect, Msg, Route, Selection};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::MethodToggled(method) => {
            if state.selection_mut().toggle(method) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionRestored(raw) => {
            let selection = raw.as_deref().map(Selection::from_query).unwrap_or_default();
            state.set_selection(selection);
            Vec::new()
        }
        Msg::ContinueClicked => {
            if state.selection().is_empty() {
                Vec::new()
            } else {
                vec![Effect::Navigate(Route::Compare(state.selection().clone()))]
            }
        }
        Msg::CompareOpened { methods } => {
            let requested = methods.as_deref().map(Selection::from_query).unwrap_or_default();
            let mut effects = Vec::new();
            if requested.is_empty() {
                if state.is_started() {
                    effects.push(Effect::ResetViewers);
                }
                state.close_comparison();
                effects.push(Effect::Navigate(Route::Selection));
            } else if &requested != state.comparison() {
                // Re-entering with the same methods keeps a running comparison.
                if state.is_started() {
                    effects.push(Effect::ResetViewers);
                }
                state.open_comparison(requested);
            }
            effects
        }
        Msg::StartClicked => {
            if state.is_started() || state.comparison().is_empty() {
                Vec::new()
            } else {
                let run_id = state.start_run();
                vec![Effect::StartViewers {
                    run_id,
                    methods: state.comparison().methods().to_vec(),
                }]
            }
        }
        Msg::ResetClicked => {
            if state.is_started() {
                state.reset_run();
                vec![Effect::ResetViewers]
            } else {
                Vec::new()
            }
        }
        Msg::ViewerUpdated {
            run_id,
            method,
            patch,
        } => {
            state.apply_viewer_patch(run_id, method, patch);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
