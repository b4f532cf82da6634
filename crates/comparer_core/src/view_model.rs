use crate::{
    format_size, format_time, loading_options, pluralize, LoadingMethod, RunId, Selection,
    ViewerState, MAX_SELECTED,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRowView {
    pub method: LoadingMethod,
    pub name: &'static str,
    pub description: &'static str,
    pub selected: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionViewModel {
    pub options: Vec<OptionRowView>,
    pub selected_count: usize,
    pub can_add_more: bool,
    pub summary: Option<String>,
    pub start_label: String,
    /// `None` while nothing is selected.
    pub start_href: Option<String>,
}

impl SelectionViewModel {
    pub fn from_selection(selection: &Selection) -> Self {
        let can_add_more = selection.can_add_more();
        let options = loading_options()
            .into_iter()
            .map(|option| {
                let selected = selection.contains(option.id);
                OptionRowView {
                    method: option.id,
                    name: option.name,
                    description: option.description,
                    selected,
                    disabled: !option.enabled || (!can_add_more && !selected),
                }
            })
            .collect();

        let count = selection.len();
        let summary = (count > 0).then(|| {
            let mut text = format!("Selected {} for comparison", pluralize(count, "method"));
            if count == MAX_SELECTED {
                text.push_str(" (maximum reached)");
            }
            text
        });
        let start_label = if count == 0 {
            "Select at least one method to continue".to_string()
        } else {
            format!("Start Comparison with {}", pluralize(count, "Method"))
        };

        Self {
            options,
            selected_count: count,
            can_add_more,
            summary,
            start_label,
            start_href: (count > 0).then(|| selection.compare_href()),
        }
    }
}

/// Border/badge status of one comparison panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    Idle,
    Loading,
    Loaded,
    Error,
}

impl PanelStatus {
    pub fn badge(self) -> Option<&'static str> {
        match self {
            PanelStatus::Idle => None,
            PanelStatus::Loading => Some("Loading..."),
            PanelStatus::Loaded => Some("Loaded"),
            PanelStatus::Error => Some("Error"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanelStatus::Idle => "idle",
            PanelStatus::Loading => "loading",
            PanelStatus::Loaded => "loaded",
            PanelStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub method: LoadingMethod,
    pub name: &'static str,
    pub status: PanelStatus,
    pub first_render: String,
    pub fully_loaded: String,
    pub interactive: String,
    pub file_size: String,
    pub error: Option<String>,
}

impl PanelView {
    fn from_state(state: &ViewerState) -> Self {
        // Only a fully loaded panel counts as done.
        let status = if state.error.is_some() {
            PanelStatus::Error
        } else if state.is_loading {
            PanelStatus::Loading
        } else if state.metrics.time_to_fully_loaded.is_some() {
            PanelStatus::Loaded
        } else {
            PanelStatus::Idle
        };
        Self {
            method: state.method,
            name: state.method.display_name(),
            status,
            first_render: format_time(state.metrics.time_to_first_render),
            fully_loaded: format_time(state.metrics.time_to_fully_loaded),
            interactive: format_time(state.metrics.time_to_interactive),
            file_size: format_size(state.metrics.file_size),
            error: state.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonViewModel {
    pub started: bool,
    pub run_id: RunId,
    pub method_count_label: String,
    pub grid_columns: usize,
    pub info_text: &'static str,
    pub panels: Vec<PanelView>,
    pub dirty: bool,
}

impl ComparisonViewModel {
    pub(crate) fn build(
        started: bool,
        run_id: RunId,
        viewers: &[ViewerState],
        dirty: bool,
    ) -> Self {
        let info_text = if started {
            "Comparing loading performance across selected methods. Check the server log for detailed timing information."
        } else {
            "Click \"Start All Viewers\" to begin the loading comparison. All viewers will start simultaneously for fair comparison."
        };
        Self {
            started,
            run_id,
            method_count_label: pluralize(viewers.len(), "Method"),
            grid_columns: viewers.len().clamp(1, MAX_SELECTED),
            info_text,
            panels: viewers.iter().map(PanelView::from_state).collect(),
            dirty,
        }
    }
}
