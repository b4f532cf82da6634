use url::form_urlencoded;

use crate::{LoadingMethod, Route};

/// Upper bound on methods compared side by side.
pub const MAX_SELECTED: usize = 3;

/// Query parameter carrying the comma-separated method identifiers.
pub const METHODS_PARAM: &str = "methods";

/// Ordered set of at most [`MAX_SELECTED`] loading methods.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    methods: Vec<LoadingMethod>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection in iteration order, dropping duplicates and
    /// anything past the cap.
    pub fn from_methods(methods: impl IntoIterator<Item = LoadingMethod>) -> Self {
        let mut selection = Self::new();
        for method in methods {
            if !selection.contains(method) && selection.can_add_more() {
                selection.methods.push(method);
            }
        }
        selection
    }

    /// Parses a comma-separated list such as `standard,linearized`.
    /// Unknown identifiers are ignored.
    pub fn from_query(raw: &str) -> Self {
        Self::from_methods(raw.split(',').filter_map(|id| id.parse().ok()))
    }

    /// Reads the `methods` parameter out of a full URL query string.
    pub fn from_url_query(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == METHODS_PARAM)
            .map(|(_, value)| Self::from_query(&value))
            .unwrap_or_default()
    }

    pub fn methods(&self) -> &[LoadingMethod] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn contains(&self, method: LoadingMethod) -> bool {
        self.methods.contains(&method)
    }

    pub fn can_add_more(&self) -> bool {
        self.methods.len() < MAX_SELECTED
    }

    /// Removes a selected method or appends an unselected one while under
    /// the cap. Returns whether the selection changed.
    pub fn toggle(&mut self, method: LoadingMethod) -> bool {
        if let Some(index) = self.methods.iter().position(|m| *m == method) {
            self.methods.remove(index);
            true
        } else if self.can_add_more() {
            self.methods.push(method);
            true
        } else {
            false
        }
    }

    pub fn toggled(&self, method: LoadingMethod) -> Self {
        let mut next = self.clone();
        next.toggle(method);
        next
    }

    pub fn to_query(&self) -> String {
        self.methods
            .iter()
            .map(|method| method.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Encodes the selection as `methods=...`, or an empty string when nothing
    /// is selected.
    pub fn to_url_query(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        form_urlencoded::Serializer::new(String::new())
            .append_pair(METHODS_PARAM, &self.to_query())
            .finish()
    }

    /// Comparison screen URL, or the selection screen when nothing is
    /// selected.
    pub fn compare_href(&self) -> String {
        if self.is_empty() {
            return Route::Selection.href();
        }
        format!("/compare?{}", self.to_url_query())
    }

    /// Selection screen URL that keeps this selection.
    pub fn selection_href(&self) -> String {
        if self.is_empty() {
            "/".to_string()
        } else {
            format!("/?{}", self.to_url_query())
        }
    }
}
