use crate::Selection;

/// Client-visible screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Method picker at `/`.
    Selection,
    /// Side-by-side comparison at `/compare?methods=...`.
    Compare(Selection),
}

impl Route {
    /// Resolves a request path and query. A comparison without any
    /// recognizable method falls back to the selection screen.
    pub fn parse(path: &str, query: Option<&str>) -> Option<Route> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Selection),
            "/compare" => {
                let selection = query.map(Selection::from_url_query).unwrap_or_default();
                if selection.is_empty() {
                    Some(Route::Selection)
                } else {
                    Some(Route::Compare(selection))
                }
            }
            _ => None,
        }
    }

    pub fn href(&self) -> String {
        match self {
            Route::Selection => "/".to_string(),
            Route::Compare(selection) => selection.compare_href(),
        }
    }
}
