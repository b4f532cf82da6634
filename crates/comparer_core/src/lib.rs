//! Comparer core: pure state machine and view-model helpers.
mod effect;
mod format;
mod method;
mod metrics;
mod msg;
mod route;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use format::{format_size, format_time, pluralize};
pub use method::{loading_options, LoadingMethod, LoadingOption, UnknownMethod};
pub use metrics::{MetricsPatch, PerformanceMetrics};
pub use msg::Msg;
pub use route::Route;
pub use selection::{Selection, MAX_SELECTED, METHODS_PARAM};
pub use state::{AppState, RunId, ViewerPatch, ViewerPhase, ViewerState};
pub use update::update;
pub use view_model::{
    ComparisonViewModel, OptionRowView, PanelStatus, PanelView, SelectionViewModel,
};
