use crate::{LoadingMethod, RunId, ViewerPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User toggled a method on the selection screen.
    MethodToggled(LoadingMethod),
    /// Selection screen entered with a `methods` query value.
    SelectionRestored(Option<String>),
    /// User asked to compare the current selection.
    ContinueClicked,
    /// Comparison screen entered with a `methods` query value.
    CompareOpened { methods: Option<String> },
    /// User clicked "Start All Viewers".
    StartClicked,
    /// User clicked "Reset Comparison".
    ResetClicked,
    /// Harness progress for one method's panel.
    ViewerUpdated {
        run_id: RunId,
        method: LoadingMethod,
        patch: ViewerPatch,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
