use std::fmt;
use std::str::FromStr;

/// Strategy used to hand a document to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoadingMethod {
    Standard,
    Linearized,
    DocumentEngine,
}

impl LoadingMethod {
    pub const ALL: [LoadingMethod; 3] = [
        LoadingMethod::Standard,
        LoadingMethod::Linearized,
        LoadingMethod::DocumentEngine,
    ];

    /// Identifier used in URLs and log prefixes.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadingMethod::Standard => "standard",
            LoadingMethod::Linearized => "linearized",
            LoadingMethod::DocumentEngine => "document-engine",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LoadingMethod::Standard => "Web SDK Viewer",
            LoadingMethod::Linearized => "Web SDK with Linearized Loading",
            LoadingMethod::DocumentEngine => "Nutrient DWS Viewer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LoadingMethod::Standard => {
                "Standard PDF loading via Web SDK. Loads the entire document before rendering."
            }
            LoadingMethod::Linearized => {
                "Progressive loading that displays the first page quickly while the rest loads in the background."
            }
            LoadingMethod::DocumentEngine => {
                "Server-side processing that streams only necessary content to the viewer for optimal performance."
            }
        }
    }
}

impl fmt::Display for LoadingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown loading method {:?}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for LoadingMethod {
    type Err = UnknownMethod;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let id = raw.trim();
        LoadingMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == id)
            .ok_or_else(|| UnknownMethod(id.to_string()))
    }
}

/// Static catalog entry shown on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingOption {
    pub id: LoadingMethod,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
}

pub fn loading_options() -> Vec<LoadingOption> {
    LoadingMethod::ALL
        .into_iter()
        .map(|method| LoadingOption {
            id: method,
            name: method.display_name(),
            description: method.description(),
            enabled: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_parse_back() {
        for method in LoadingMethod::ALL {
            assert_eq!(method.as_str().parse::<LoadingMethod>(), Ok(method));
        }
        assert_eq!(
            "document_engine".parse::<LoadingMethod>(),
            Err(UnknownMethod("document_engine".to_string()))
        );
    }

    #[test]
    fn catalog_lists_every_method_enabled() {
        let options = loading_options();
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|option| option.enabled));
        assert_eq!(options[1].name, "Web SDK with Linearized Loading");
    }
}
