use std::fmt;

use comparer_core::LoadingMethod;
use thiserror::Error;

use crate::{normalize_server_url, DocumentSettings};

/// Container a viewer instance is mounted in. Each method owns exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub LoadingMethod);

impl ContainerId {
    pub fn for_method(method: LoadingMethod) -> Self {
        Self(method)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Static document reference.
    Url(String),
    /// Document hosted by a document engine, reached with a session token.
    Server {
        server_url: String,
        document_id: String,
        jwt: String,
    },
}

/// Configuration handed to [`crate::Viewer::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub container: ContainerId,
    pub source: DocumentSource,
    pub license_key: Option<String>,
    /// `None` for server-hosted documents, where the flag does not apply.
    pub allow_linearized_loading: Option<bool>,
    pub instant: bool,
}

impl ViewerConfig {
    /// URL of a statically referenced document.
    pub fn resource_url(&self) -> Option<&str> {
        match &self.source {
            DocumentSource::Url(url) => Some(url),
            DocumentSource::Server { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Nutrient DWS credentials not configured (missing {})", .missing.join(", "))]
    MissingDocumentEngineCredentials { missing: Vec<&'static str> },
}

/// Builds the viewer configuration for a method. Pure: no viewer required.
pub fn profile_for(
    method: LoadingMethod,
    container: ContainerId,
    documents: &DocumentSettings,
) -> Result<ViewerConfig, ProfileError> {
    match method {
        LoadingMethod::Standard => Ok(ViewerConfig {
            container,
            source: DocumentSource::Url(documents.standard_url.clone()),
            license_key: documents.license_key.clone(),
            allow_linearized_loading: Some(false),
            instant: false,
        }),
        LoadingMethod::Linearized => Ok(ViewerConfig {
            container,
            source: DocumentSource::Url(documents.linearized_url.clone()),
            license_key: documents.license_key.clone(),
            allow_linearized_loading: Some(true),
            instant: false,
        }),
        LoadingMethod::DocumentEngine => {
            let engine = &documents.document_engine;
            let server_url = non_empty(engine.server_url.as_deref());
            let document_id = non_empty(engine.document_id.as_deref());
            let jwt = non_empty(engine.jwt.as_deref());

            match (server_url, document_id, jwt) {
                (Some(server_url), Some(document_id), Some(jwt)) => Ok(ViewerConfig {
                    container,
                    source: DocumentSource::Server {
                        server_url: normalize_server_url(server_url),
                        document_id: document_id.to_string(),
                        jwt: jwt.to_string(),
                    },
                    license_key: None,
                    allow_linearized_loading: None,
                    instant: false,
                }),
                (server_url, document_id, jwt) => {
                    let missing = [
                        ("server URL", server_url.is_none()),
                        ("document id", document_id.is_none()),
                        ("token", jwt.is_none()),
                    ]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                    Err(ProfileError::MissingDocumentEngineCredentials { missing })
                }
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentEngineSettings;

    fn container(method: LoadingMethod) -> ContainerId {
        ContainerId::for_method(method)
    }

    #[test]
    fn standard_disables_linearized_loading() {
        let documents = DocumentSettings {
            license_key: Some("lic".to_string()),
            ..DocumentSettings::default()
        };
        let config = profile_for(LoadingMethod::Standard, container(LoadingMethod::Standard), &documents)
            .unwrap();
        assert_eq!(config.allow_linearized_loading, Some(false));
        assert_eq!(config.resource_url(), Some(documents.standard_url.as_str()));
        assert_eq!(config.license_key.as_deref(), Some("lic"));
    }

    #[test]
    fn linearized_enables_linearized_loading() {
        let documents = DocumentSettings::default();
        let config = profile_for(
            LoadingMethod::Linearized,
            container(LoadingMethod::Linearized),
            &documents,
        )
        .unwrap();
        assert_eq!(config.allow_linearized_loading, Some(true));
        assert_eq!(config.resource_url(), Some(documents.linearized_url.as_str()));
    }

    #[test]
    fn document_engine_requires_all_credentials() {
        let mut documents = DocumentSettings {
            document_engine: DocumentEngineSettings {
                server_url: Some("https://engine.example.com".to_string()),
                document_id: Some(" ".to_string()),
                jwt: None,
            },
            ..DocumentSettings::default()
        };
        let method = LoadingMethod::DocumentEngine;
        let err = profile_for(method, container(method), &documents).unwrap_err();
        assert_eq!(
            err,
            ProfileError::MissingDocumentEngineCredentials {
                missing: vec!["document id", "token"]
            }
        );
        assert!(err.to_string().starts_with("Nutrient DWS credentials not configured"));

        documents.document_engine.document_id = Some("doc-1".to_string());
        documents.document_engine.jwt = Some("token".to_string());
        let config = profile_for(method, container(method), &documents).unwrap();
        assert_eq!(
            config.source,
            DocumentSource::Server {
                server_url: "https://engine.example.com/".to_string(),
                document_id: "doc-1".to_string(),
                jwt: "token".to_string(),
            }
        );
        assert_eq!(config.resource_url(), None);
        assert!(!config.instant);
    }
}
